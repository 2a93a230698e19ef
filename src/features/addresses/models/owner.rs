use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The host record an address or location belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Owner {
    /// Host model name, e.g. `user` or `App\Models\Shop`
    pub owner_type: String,
    /// Host record id; any string the host uses
    pub owner_id: String,
}

/// Owner row keyed by the owned record
#[derive(Debug, Clone, FromRow)]
pub struct OwnerRelation {
    pub record_id: Uuid,
    #[sqlx(flatten)]
    pub owner: Owner,
}
