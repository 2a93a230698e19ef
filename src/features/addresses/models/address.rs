use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::locations::models::LocationRefs;
use crate::shared::lifecycle::SoftDeletable;

/// A postal address. Its owner lives in the address relation table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Address {
    pub id: Uuid,
    pub country_id: Uuid,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    /// blvd, street, alley, number, floor, unit
    pub address: Value,
    pub postcode: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// mobile_prefix, mobile, name, landline, notes
    pub info: Value,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Address {
    pub fn refs(&self) -> LocationRefs {
        LocationRefs {
            country_id: Some(self.country_id),
            province_id: self.province_id,
            city_id: self.city_id,
            district_id: self.district_id,
        }
    }
}

impl SoftDeletable for Address {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
