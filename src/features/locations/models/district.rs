use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::lifecycle::SoftDeletable;

/// Lowest level of the hierarchy; searchable by its keywords
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct District {
    pub id: Uuid,
    pub city_id: Uuid,
    pub name: String,
    pub subtitle: Option<String>,
    pub keywords: Vec<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeletable for District {
    fn id(&self) -> Uuid {
        self.id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
