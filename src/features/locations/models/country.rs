use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::lifecycle::SoftDeletable;

/// Top of the hierarchy. Names are unique across all live countries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub flag: Option<String>,
    /// Dialling prefix without the plus sign
    pub mobile_prefix: Option<String>,
    /// Per-country validation patterns for address fields (e.g. postcode)
    pub validation: Option<Value>,
    /// Template used when printing an address on a letter
    pub address_on_letter: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for Country {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
