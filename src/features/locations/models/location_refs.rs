use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::LocationKind;

/// A (country, province, city, district) tuple; any level may be unset
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, ToSchema,
)]
pub struct LocationRefs {
    pub country_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
}

impl LocationRefs {
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, id)| id.is_none())
    }

    /// Each level paired with its id, top-down
    pub fn entries(&self) -> [(LocationKind, Option<Uuid>); 4] {
        [
            (LocationKind::Country, self.country_id),
            (LocationKind::Province, self.province_id),
            (LocationKind::City, self.city_id),
            (LocationKind::District, self.district_id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(LocationRefs::default().is_empty());
        let refs = LocationRefs {
            city_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        assert!(!refs.is_empty());
    }
}
