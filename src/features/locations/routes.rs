use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::locations::handlers;
use crate::features::locations::services::LocationServices;

/// Admin routes for countries, provinces, cities and districts
pub fn routes(services: LocationServices) -> Router {
    Router::new()
        .merge(
            Router::new()
                .route(
                    "/api/admin/location/countries",
                    get(handlers::list_countries)
                        .post(handlers::store_country)
                        .options(handlers::country_capabilities),
                )
                .route(
                    "/api/admin/location/countries/create",
                    get(handlers::create_country_form),
                )
                .route("/api/admin/location/countries/bulk", post(handlers::bulk_countries))
                .route(
                    "/api/admin/location/countries/{id}/edit",
                    get(handlers::edit_country),
                )
                .route("/api/admin/location/countries/{id}", put(handlers::update_country))
                .with_state(services.countries),
        )
        .merge(
            Router::new()
                .route(
                    "/api/admin/location/provinces",
                    get(handlers::list_provinces)
                        .post(handlers::store_province)
                        .options(handlers::province_capabilities),
                )
                .route(
                    "/api/admin/location/provinces/create",
                    get(handlers::create_province_form),
                )
                .route("/api/admin/location/provinces/bulk", post(handlers::bulk_provinces))
                .route(
                    "/api/admin/location/provinces/{id}/edit",
                    get(handlers::edit_province),
                )
                .route("/api/admin/location/provinces/{id}", put(handlers::update_province))
                .with_state(services.provinces),
        )
        .merge(
            Router::new()
                .route(
                    "/api/admin/location/cities",
                    get(handlers::list_cities)
                        .post(handlers::store_city)
                        .options(handlers::city_capabilities),
                )
                .route("/api/admin/location/cities/create", get(handlers::create_city_form))
                .route("/api/admin/location/cities/bulk", post(handlers::bulk_cities))
                .route("/api/admin/location/cities/{id}/edit", get(handlers::edit_city))
                .route("/api/admin/location/cities/{id}", put(handlers::update_city))
                .with_state(services.cities),
        )
        .merge(
            Router::new()
                .route(
                    "/api/admin/location/districts",
                    get(handlers::list_districts)
                        .post(handlers::store_district)
                        .options(handlers::district_capabilities),
                )
                .route(
                    "/api/admin/location/districts/create",
                    get(handlers::create_district_form),
                )
                .route("/api/admin/location/districts/bulk", post(handlers::bulk_districts))
                .route(
                    "/api/admin/location/districts/{id}/edit",
                    get(handlers::edit_district),
                )
                .route("/api/admin/location/districts/{id}", put(handlers::update_district))
                .with_state(services.districts),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{lazy_pool, test_events, test_tables};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server() -> TestServer {
        let services = LocationServices::new(lazy_pool(), test_tables(), test_events());
        TestServer::new(routes(services)).unwrap()
    }

    #[tokio::test]
    async fn test_options_reports_capabilities() {
        let server = server();
        let response = server
            .method(axum::http::Method::OPTIONS, "/api/admin/location/districts")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["entity"], "district");
        assert!(body["data"]["filters"]
            .as_array()
            .unwrap()
            .contains(&json!("city_id")));
        assert_eq!(body["data"]["bulk_actions"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_sort_is_bad_request() {
        let server = server();
        let response = server
            .get("/api/admin/location/countries")
            .add_query_param("sort", "-password")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_filter_is_bad_request() {
        let server = server();
        let response = server
            .get("/api/admin/location/cities")
            .add_query_param("filter[province_id]", "not-a-uuid")
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_filter_foreign_to_entity_is_bad_request() {
        let server = server();
        let response = server
            .get("/api/admin/location/provinces")
            .add_query_param("filter[province_id]", uuid::Uuid::now_v7().to_string())
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("'province_id'"));
    }

    #[tokio::test]
    async fn test_bulk_without_ids_is_rejected_before_database() {
        let server = server();
        let response = server
            .post("/api/admin/location/provinces/bulk")
            .json(&json!({"action": "delete", "ids": []}))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["errors"][0].as_str().unwrap().starts_with("ids: "));
    }
}
