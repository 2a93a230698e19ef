use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::addresses::models::{LocationPointer, Owner};
use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::LocationRefs;
use crate::shared::types::nullable;
use crate::shared::validation::OWNER_TYPE_REGEX;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLocationDto {
    #[validate(regex(path = *OWNER_TYPE_REGEX, message = "The owner type is invalid."))]
    pub owner_type: String,

    #[validate(length(min = 1, max = 64, message = "The owner id must be between 1 and 64 characters."))]
    pub owner_id: String,

    /// Required; reported as a field error when missing
    pub country_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,

    pub status: Option<bool>,
}

impl CreateLocationDto {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLocationDto {
    pub country_id: Option<Uuid>,

    /// `null` detaches the pointer from its province
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub province_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub city_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub district_id: Option<Option<Uuid>>,

    pub status: Option<bool>,
}

impl UpdateLocationDto {
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
pub struct LocationResponseDto {
    pub id: Uuid,
    pub owner: Option<Owner>,
    pub country_id: Uuid,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LocationResponseDto {
    pub fn new(location: LocationPointer, owner: Option<Owner>) -> Self {
        Self {
            id: location.id,
            owner,
            country_id: location.country_id,
            province_id: location.province_id,
            city_id: location.city_id,
            district_id: location.district_id,
            status: location.status,
            created_at: location.created_at,
            updated_at: location.updated_at,
            deleted_at: location.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationEditDto {
    pub record: LocationResponseDto,
    pub form: LocationFormDto,
}
