use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::locations::models::LocationRefs;
use crate::shared::lifecycle::SoftDeletable;

/// A named region made of arbitrary hierarchy rows
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeoArea {
    pub id: Uuid,
    /// Locale → text
    pub name: Value,
    /// Locale → text
    pub description: Option<Value>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for GeoArea {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

/// One member of a geo-area
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeoAreaRelation {
    pub id: Uuid,
    pub geo_area_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub location: LocationRefs,
}
