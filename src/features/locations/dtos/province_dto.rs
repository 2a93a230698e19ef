use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::Province;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProvinceDto {
    pub country_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,

    pub status: Option<bool>,
}

/// Partial update; moving to another country re-checks the name there
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProvinceDto {
    pub country_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: Option<String>,

    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvinceResponseDto {
    pub id: Uuid,
    pub country_id: Uuid,
    pub name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Province> for ProvinceResponseDto {
    fn from(province: Province) -> Self {
        Self {
            id: province.id,
            country_id: province.country_id,
            name: province.name,
            status: province.status,
            created_at: province.created_at,
            updated_at: province.updated_at,
            deleted_at: province.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvinceEditDto {
    pub record: ProvinceResponseDto,
    pub form: LocationFormDto,
}
