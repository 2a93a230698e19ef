use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::City;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCityDto {
    pub province_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,

    pub status: Option<bool>,
}

/// Partial update; moving to another province re-checks the name there
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCityDto {
    pub province_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: Option<String>,

    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CityResponseDto {
    pub id: Uuid,
    pub province_id: Uuid,
    pub name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<City> for CityResponseDto {
    fn from(city: City) -> Self {
        Self {
            id: city.id,
            province_id: city.province_id,
            name: city.name,
            status: city.status,
            created_at: city.created_at,
            updated_at: city.updated_at,
            deleted_at: city.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CityEditDto {
    pub record: CityResponseDto,
    pub form: LocationFormDto,
}
