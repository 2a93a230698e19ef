use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::locations::models::LocationRefs;
use crate::shared::lifecycle::SoftDeletable;

/// Binds an owner to a place in the hierarchy without a full address
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LocationPointer {
    pub id: Uuid,
    pub country_id: Uuid,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LocationPointer {
    pub fn refs(&self) -> LocationRefs {
        LocationRefs {
            country_id: Some(self.country_id),
            province_id: self.province_id,
            city_id: self.city_id,
            district_id: self.district_id,
        }
    }
}

impl SoftDeletable for LocationPointer {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
