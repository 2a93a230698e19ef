use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::lifecycle::SoftDeletable;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct City {
    pub id: Uuid,
    pub province_id: Uuid,
    pub name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for City {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
