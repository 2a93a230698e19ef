use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::geo_areas::handlers;
use crate::features::geo_areas::services::GeoAreaService;

pub fn routes(service: Arc<GeoAreaService>) -> Router {
    Router::new()
        .route(
            "/api/admin/location/geo-areas",
            get(handlers::list_geo_areas)
                .post(handlers::store_geo_area)
                .options(handlers::geo_area_capabilities),
        )
        .route(
            "/api/admin/location/geo-areas/create",
            get(handlers::create_geo_area_form),
        )
        .route("/api/admin/location/geo-areas/bulk", post(handlers::bulk_geo_areas))
        .route(
            "/api/admin/location/geo-areas/{id}/edit",
            get(handlers::edit_geo_area),
        )
        .route("/api/admin/location/geo-areas/{id}", put(handlers::update_geo_area))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::locations::rules::PgLocationDirectory;
    use crate::shared::test_helpers::{lazy_pool, test_events, test_tables};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server() -> TestServer {
        let pool = lazy_pool();
        let tables = test_tables();
        let directory = Arc::new(PgLocationDirectory::new(pool.clone(), tables.clone()));
        let service = GeoAreaService::new(pool, tables, directory, test_events());
        TestServer::new(routes(Arc::new(service))).unwrap()
    }

    #[tokio::test]
    async fn test_options_lists_bulk_actions() {
        let response = server()
            .method(axum::http::Method::OPTIONS, "/api/admin/location/geo-areas")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["entity"], "geo_area");
        assert_eq!(
            body["data"]["bulk_actions"],
            json!(["delete", "restore", "force_delete", "activate", "deactivate"])
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = server()
            .post("/api/admin/location/geo-areas")
            .json(&json!({"name": "not a translation map", "locations": []}))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }
}
