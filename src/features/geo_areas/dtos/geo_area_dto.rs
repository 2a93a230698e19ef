use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::geo_areas::models::GeoArea;
use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::LocationRefs;
use crate::shared::types::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGeoAreaDto {
    /// Locale → name, e.g. `{"en": "Caspian coast"}`
    pub name: BTreeMap<String, String>,

    /// Locale → description
    pub description: Option<BTreeMap<String, String>>,

    pub status: Option<bool>,

    /// Member rows; each sets at least one level and appears once
    pub locations: Vec<LocationRefs>,
}

/// Partial update. A present `locations` list replaces the whole set and a
/// `null` description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGeoAreaDto {
    pub name: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Object>)]
    pub description: Option<Option<BTreeMap<String, String>>>,
    pub status: Option<bool>,
    pub locations: Option<Vec<LocationRefs>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeoAreaResponseDto {
    pub id: Uuid,
    #[schema(value_type = Object)]
    pub name: Value,
    #[schema(value_type = Option<Object>)]
    pub description: Option<Value>,
    pub status: bool,
    pub locations: Vec<LocationRefs>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl GeoAreaResponseDto {
    pub fn new(area: GeoArea, locations: Vec<LocationRefs>) -> Self {
        Self {
            id: area.id,
            name: area.name,
            description: area.description,
            status: area.status,
            locations,
            created_at: area.created_at,
            updated_at: area.updated_at,
            deleted_at: area.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeoAreaEditDto {
    pub record: GeoAreaResponseDto,
    pub form: LocationFormDto,
}
