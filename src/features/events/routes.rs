use axum::{routing::get, Router};

use crate::features::events::handlers;

/// Read-only routes describing the emitted events
pub fn routes() -> Router {
    Router::new().route("/api/admin/location/events", get(handlers::list_events))
}
