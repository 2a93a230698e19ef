use axum::Json;

use crate::core::error::Result;
use crate::features::events::registry::{self, EventMeta};
use crate::shared::types::ApiResponse;

/// List every lifecycle event the service emits
#[utoipa::path(
    get,
    path = "/api/admin/location/events",
    responses(
        (status = 200, description = "Event registry", body = ApiResponse<Vec<EventMeta>>)
    ),
    tag = "events"
)]
pub async fn list_events() -> Result<Json<ApiResponse<Vec<EventMeta>>>> {
    Ok(Json(ApiResponse::success(Some(registry::all()), None, None)))
}
