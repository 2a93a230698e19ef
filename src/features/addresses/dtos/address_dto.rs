use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::addresses::models::{Address, Owner};
use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::LocationRefs;
use crate::shared::types::nullable;
use crate::shared::validation::OWNER_TYPE_REGEX;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAddressDto {
    #[validate(regex(path = *OWNER_TYPE_REGEX, message = "The owner type is invalid."))]
    pub owner_type: String,

    #[validate(length(min = 1, max = 64, message = "The owner id must be between 1 and 64 characters."))]
    pub owner_id: String,

    /// Required; reported as a field error when missing
    pub country_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,

    /// Keys: blvd, street, alley, number, floor, unit
    #[schema(value_type = Option<Object>)]
    pub address: Option<Map<String, Value>>,

    #[validate(length(max = 20, message = "The postcode may not be greater than 20 characters."))]
    pub postcode: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "The lat must be between -90 and 90."))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "The lng must be between -180 and 180."))]
    pub lng: Option<f64>,

    /// Keys: mobile_prefix, mobile, name, landline, notes
    #[schema(value_type = Option<Object>)]
    pub info: Option<Map<String, Value>>,

    pub status: Option<bool>,
}

impl CreateAddressDto {
    pub fn refs(&self) -> LocationRefs {
        LocationRefs {
            country_id: self.country_id,
            province_id: self.province_id,
            city_id: self.city_id,
            district_id: self.district_id,
        }
    }

    pub fn owner(&self) -> Owner {
        Owner {
            owner_type: self.owner_type.clone(),
            owner_id: self.owner_id.clone(),
        }
    }
}

/// Partial update. `address` and `info` replace the stored object when present;
/// `null` clears the lower levels, the postcode and the coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressDto {
    pub country_id: Option<Uuid>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub province_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub city_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub district_id: Option<Option<Uuid>>,

    #[schema(value_type = Option<Object>)]
    pub address: Option<Map<String, Value>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 20, message = "The postcode may not be greater than 20 characters."))]
    pub postcode: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<f64>)]
    #[validate(range(min = -90.0, max = 90.0, message = "The lat must be between -90 and 90."))]
    pub lat: Option<Option<f64>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<f64>)]
    #[validate(range(min = -180.0, max = 180.0, message = "The lng must be between -180 and 180."))]
    pub lng: Option<Option<f64>>,

    #[schema(value_type = Option<Object>)]
    pub info: Option<Map<String, Value>>,

    pub status: Option<bool>,
}

impl UpdateAddressDto {
    /// Only the levels this update sets to an id
    pub fn refs(&self) -> LocationRefs {
        LocationRefs {
            country_id: self.country_id,
            province_id: self.province_id.flatten(),
            city_id: self.city_id.flatten(),
            district_id: self.district_id.flatten(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressResponseDto {
    pub id: Uuid,
    pub owner: Option<Owner>,
    pub country_id: Uuid,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub address: Value,
    pub postcode: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[schema(value_type = Object)]
    pub info: Value,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AddressResponseDto {
    pub fn new(address: Address, owner: Option<Owner>) -> Self {
        Self {
            id: address.id,
            owner,
            country_id: address.country_id,
            province_id: address.province_id,
            city_id: address.city_id,
            district_id: address.district_id,
            address: address.address,
            postcode: address.postcode,
            lat: address.lat,
            lng: address.lng,
            info: address.info,
            status: address.status,
            created_at: address.created_at,
            updated_at: address.updated_at,
            deleted_at: address.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressEditDto {
    pub record: AddressResponseDto,
    pub form: LocationFormDto,
}
