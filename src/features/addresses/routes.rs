use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::addresses::handlers;
use crate::features::addresses::services::{AddressService, LocationService};

/// Admin routes for addresses and location pointers
pub fn routes(addresses: Arc<AddressService>, locations: Arc<LocationService>) -> Router {
    Router::new()
        .merge(
            Router::new()
                .route(
                    "/api/admin/location/addresses",
                    get(handlers::list_addresses)
                        .post(handlers::store_address)
                        .options(handlers::address_capabilities),
                )
                .route(
                    "/api/admin/location/addresses/create",
                    get(handlers::create_address_form),
                )
                .route("/api/admin/location/addresses/bulk", post(handlers::bulk_addresses))
                .route(
                    "/api/admin/location/addresses/owners/{owner_type}/{owner_id}",
                    get(handlers::list_addresses_by_owner),
                )
                .route(
                    "/api/admin/location/addresses/{id}/edit",
                    get(handlers::edit_address),
                )
                .route("/api/admin/location/addresses/{id}", put(handlers::update_address))
                .with_state(addresses),
        )
        .merge(
            Router::new()
                .route(
                    "/api/admin/location/locations",
                    get(handlers::list_locations)
                        .post(handlers::store_location)
                        .options(handlers::location_capabilities),
                )
                .route(
                    "/api/admin/location/locations/create",
                    get(handlers::create_location_form),
                )
                .route("/api/admin/location/locations/bulk", post(handlers::bulk_locations))
                .route(
                    "/api/admin/location/locations/owners/{owner_type}/{owner_id}",
                    get(handlers::list_locations_by_owner),
                )
                .route(
                    "/api/admin/location/locations/{id}/edit",
                    get(handlers::edit_location),
                )
                .route("/api/admin/location/locations/{id}", put(handlers::update_location))
                .with_state(locations),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::locations::rules::PgLocationDirectory;
    use crate::shared::test_helpers::{lazy_pool, test_events, test_tables};
    use axum_test::TestServer;
    use serde_json::Value;

    fn server() -> TestServer {
        let pool = lazy_pool();
        let tables = test_tables();
        let directory = Arc::new(PgLocationDirectory::new(pool.clone(), tables.clone()));
        let addresses = AddressService::new(
            pool.clone(),
            tables.clone(),
            directory.clone(),
            test_events(),
        );
        let locations = LocationService::new(pool, tables, directory, test_events());
        TestServer::new(routes(Arc::new(addresses), Arc::new(locations))).unwrap()
    }

    #[tokio::test]
    async fn test_address_capabilities() {
        let response = server()
            .method(axum::http::Method::OPTIONS, "/api/admin/location/addresses")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["entity"], "address");
        assert_eq!(body["data"]["sortable"][0], "postcode");
    }

    #[tokio::test]
    async fn test_location_sort_outside_allow_list() {
        let response = server()
            .get("/api/admin/location/locations")
            .add_query_param("sort", "postcode")
            .await;

        response.assert_status_bad_request();
    }
}
