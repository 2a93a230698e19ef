use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::events::EntityKind;

/// Lifecycle action applied by a bulk request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Delete,
    Restore,
    ForceDelete,
    Activate,
    Deactivate,
}

impl BulkAction {
    pub const ALL: [BulkAction; 5] = [
        BulkAction::Delete,
        BulkAction::Restore,
        BulkAction::ForceDelete,
        BulkAction::Activate,
        BulkAction::Deactivate,
    ];
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkActionDto {
    pub action: BulkAction,

    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 ids are required."))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkFailureDto {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BulkActionResultDto {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkFailureDto>,
}

/// Answer to an `OPTIONS` request on a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CapabilitiesDto {
    pub entity: EntityKind,
    /// Actions accepted by the `bulk` endpoint
    pub bulk_actions: Vec<BulkAction>,
    /// Columns accepted by `sort`
    pub sortable: Vec<String>,
    /// Keys accepted as `filter[<key>]`
    pub filters: Vec<String>,
}

impl CapabilitiesDto {
    pub fn new(entity: EntityKind, sortable: &[&str], filters: &[&str]) -> Self {
        Self {
            entity,
            bulk_actions: BulkAction::ALL.to_vec(),
            sortable: sortable.iter().map(|s| s.to_string()).collect(),
            filters: filters.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bulk_dto_requires_ids() {
        let dto: BulkActionDto =
            serde_json::from_value(json!({"action": "force_delete", "ids": []})).unwrap();
        assert_eq!(dto.action, BulkAction::ForceDelete);
        assert!(dto.validate().is_err());

        let dto: BulkActionDto = serde_json::from_value(
            json!({"action": "activate", "ids": [Uuid::now_v7()]}),
        )
        .unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_unknown_bulk_action_rejected() {
        let parsed = serde_json::from_value::<BulkActionDto>(
            json!({"action": "truncate", "ids": [Uuid::now_v7()]}),
        );
        assert!(parsed.is_err());
    }
}
