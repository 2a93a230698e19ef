use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::Country;
use crate::shared::types::nullable;
use crate::shared::validation::MOBILE_PREFIX_REGEX;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCountryDto {
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,

    #[validate(length(max = 255, message = "The flag may not be greater than 255 characters."))]
    pub flag: Option<String>,

    #[validate(regex(path = *MOBILE_PREFIX_REGEX, message = "The mobile prefix must be 1 to 4 digits."))]
    pub mobile_prefix: Option<String>,

    /// Field name → pattern map applied to addresses in this country
    #[schema(value_type = Option<Object>)]
    pub validation: Option<Value>,

    #[validate(length(max = 2000, message = "The address on letter may not be greater than 2000 characters."))]
    pub address_on_letter: Option<String>,

    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCountryDto {
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: Option<String>,

    /// `null` clears the flag
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 255, message = "The flag may not be greater than 255 characters."))]
    pub flag: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(regex(path = *MOBILE_PREFIX_REGEX, message = "The mobile prefix must be 1 to 4 digits."))]
    pub mobile_prefix: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Object>)]
    pub validation: Option<Option<Value>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 2000, message = "The address on letter may not be greater than 2000 characters."))]
    pub address_on_letter: Option<Option<String>>,

    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountryResponseDto {
    pub id: Uuid,
    pub name: String,
    pub flag: Option<String>,
    pub mobile_prefix: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub validation: Option<Value>,
    pub address_on_letter: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Country> for CountryResponseDto {
    fn from(country: Country) -> Self {
        Self {
            id: country.id,
            name: country.name,
            flag: country.flag,
            mobile_prefix: country.mobile_prefix,
            validation: country.validation,
            address_on_letter: country.address_on_letter,
            status: country.status,
            created_at: country.created_at,
            updated_at: country.updated_at,
            deleted_at: country.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountryEditDto {
    pub record: CountryResponseDto,
    pub form: LocationFormDto,
}
