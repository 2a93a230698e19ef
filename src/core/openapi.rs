use utoipa::{Modify, OpenApi};

use crate::features::addresses::{
    dtos as addresses_dtos, handlers as addresses_handlers, models as addresses_models,
};
use crate::features::events::{handlers as events_handlers, models as events_models, registry};
use crate::features::geo_areas::{dtos as geo_areas_dtos, handlers as geo_areas_handlers};
use crate::features::locations::{
    dtos as locations_dtos, handlers as locations_handlers, models as locations_models,
};
use crate::shared::bulk::{
    BulkAction, BulkActionDto, BulkActionResultDto, BulkFailureDto, CapabilitiesDto,
};
use crate::shared::query::{SortDirection, TrashedFilter};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Countries
        locations_handlers::list_countries,
        locations_handlers::create_country_form,
        locations_handlers::store_country,
        locations_handlers::edit_country,
        locations_handlers::update_country,
        locations_handlers::country_capabilities,
        locations_handlers::bulk_countries,
        // Provinces
        locations_handlers::list_provinces,
        locations_handlers::create_province_form,
        locations_handlers::store_province,
        locations_handlers::edit_province,
        locations_handlers::update_province,
        locations_handlers::province_capabilities,
        locations_handlers::bulk_provinces,
        // Cities
        locations_handlers::list_cities,
        locations_handlers::create_city_form,
        locations_handlers::store_city,
        locations_handlers::edit_city,
        locations_handlers::update_city,
        locations_handlers::city_capabilities,
        locations_handlers::bulk_cities,
        // Districts
        locations_handlers::list_districts,
        locations_handlers::create_district_form,
        locations_handlers::store_district,
        locations_handlers::edit_district,
        locations_handlers::update_district,
        locations_handlers::district_capabilities,
        locations_handlers::bulk_districts,
        // Geo-areas
        geo_areas_handlers::list_geo_areas,
        geo_areas_handlers::create_geo_area_form,
        geo_areas_handlers::store_geo_area,
        geo_areas_handlers::edit_geo_area,
        geo_areas_handlers::update_geo_area,
        geo_areas_handlers::geo_area_capabilities,
        geo_areas_handlers::bulk_geo_areas,
        // Addresses
        addresses_handlers::list_addresses,
        addresses_handlers::list_addresses_by_owner,
        addresses_handlers::create_address_form,
        addresses_handlers::store_address,
        addresses_handlers::edit_address,
        addresses_handlers::update_address,
        addresses_handlers::address_capabilities,
        addresses_handlers::bulk_addresses,
        // Location pointers
        addresses_handlers::list_locations,
        addresses_handlers::list_locations_by_owner,
        addresses_handlers::create_location_form,
        addresses_handlers::store_location,
        addresses_handlers::edit_location,
        addresses_handlers::update_location,
        addresses_handlers::location_capabilities,
        addresses_handlers::bulk_locations,
        // Events
        events_handlers::list_events,
    ),
    components(
        schemas(
            // Shared
            Meta,
            SortDirection,
            TrashedFilter,
            BulkAction,
            BulkActionDto,
            BulkFailureDto,
            BulkActionResultDto,
            CapabilitiesDto,
            ApiResponse<BulkActionResultDto>,
            ApiResponse<CapabilitiesDto>,
            // Hierarchy
            locations_models::LocationKind,
            locations_models::LocationRefs,
            locations_dtos::LocationOptionDto,
            locations_dtos::LocationFormDto,
            ApiResponse<locations_dtos::LocationFormDto>,
            locations_dtos::CreateCountryDto,
            locations_dtos::UpdateCountryDto,
            locations_dtos::CountryResponseDto,
            locations_dtos::CountryEditDto,
            ApiResponse<Vec<locations_dtos::CountryResponseDto>>,
            ApiResponse<locations_dtos::CountryResponseDto>,
            ApiResponse<locations_dtos::CountryEditDto>,
            locations_dtos::CreateProvinceDto,
            locations_dtos::UpdateProvinceDto,
            locations_dtos::ProvinceResponseDto,
            locations_dtos::ProvinceEditDto,
            ApiResponse<Vec<locations_dtos::ProvinceResponseDto>>,
            ApiResponse<locations_dtos::ProvinceResponseDto>,
            ApiResponse<locations_dtos::ProvinceEditDto>,
            locations_dtos::CreateCityDto,
            locations_dtos::UpdateCityDto,
            locations_dtos::CityResponseDto,
            locations_dtos::CityEditDto,
            ApiResponse<Vec<locations_dtos::CityResponseDto>>,
            ApiResponse<locations_dtos::CityResponseDto>,
            ApiResponse<locations_dtos::CityEditDto>,
            locations_dtos::CreateDistrictDto,
            locations_dtos::UpdateDistrictDto,
            locations_dtos::DistrictResponseDto,
            locations_dtos::DistrictEditDto,
            ApiResponse<Vec<locations_dtos::DistrictResponseDto>>,
            ApiResponse<locations_dtos::DistrictResponseDto>,
            ApiResponse<locations_dtos::DistrictEditDto>,
            // Geo-areas
            geo_areas_dtos::CreateGeoAreaDto,
            geo_areas_dtos::UpdateGeoAreaDto,
            geo_areas_dtos::GeoAreaResponseDto,
            geo_areas_dtos::GeoAreaEditDto,
            ApiResponse<Vec<geo_areas_dtos::GeoAreaResponseDto>>,
            ApiResponse<geo_areas_dtos::GeoAreaResponseDto>,
            ApiResponse<geo_areas_dtos::GeoAreaEditDto>,
            // Addresses and location pointers
            addresses_models::Owner,
            addresses_dtos::CreateAddressDto,
            addresses_dtos::UpdateAddressDto,
            addresses_dtos::AddressResponseDto,
            addresses_dtos::AddressEditDto,
            ApiResponse<Vec<addresses_dtos::AddressResponseDto>>,
            ApiResponse<addresses_dtos::AddressResponseDto>,
            ApiResponse<addresses_dtos::AddressEditDto>,
            addresses_dtos::CreateLocationDto,
            addresses_dtos::UpdateLocationDto,
            addresses_dtos::LocationResponseDto,
            addresses_dtos::LocationEditDto,
            ApiResponse<Vec<addresses_dtos::LocationResponseDto>>,
            ApiResponse<addresses_dtos::LocationResponseDto>,
            ApiResponse<addresses_dtos::LocationEditDto>,
            // Events
            events_models::EntityKind,
            events_models::LifecyclePhase,
            registry::EventMeta,
            ApiResponse<Vec<registry::EventMeta>>,
        )
    ),
    tags(
        (name = "locations", description = "Countries, provinces, cities and districts"),
        (name = "geo-areas", description = "Named groups of hierarchy nodes"),
        (name = "addresses", description = "Owned addresses and location pointers"),
        (name = "events", description = "Lifecycle events emitted by every write"),
    ),
    info(
        title = "Location Management API",
        version = "0.1.0",
        description = "API documentation for the location hierarchy service",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_admin_path_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/admin/location/countries",
            "/api/admin/location/provinces/{id}",
            "/api/admin/location/cities/bulk",
            "/api/admin/location/districts/create",
            "/api/admin/location/geo-areas/{id}/edit",
            "/api/admin/location/addresses/owners/{owner_type}/{owner_id}",
            "/api/admin/location/locations",
            "/api/admin/location/events",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_province_forms_take_no_query() {
        let doc = ApiDoc::openapi();
        let params = |path: &str| -> Vec<String> {
            doc.paths.paths[path]
                .get
                .as_ref()
                .and_then(|operation| operation.parameters.clone())
                .unwrap_or_default()
                .into_iter()
                .map(|parameter| parameter.name)
                .collect()
        };

        assert!(params("/api/admin/location/provinces/create").is_empty());
        assert_eq!(params("/api/admin/location/provinces/{id}/edit"), vec!["id"]);
        assert!(!params("/api/admin/location/cities/create").is_empty());
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Geo".to_string(),
            version: "2.0.0".to_string(),
            description: "Custom".to_string(),
        }
        .modify(&mut doc);
        assert_eq!(doc.info.title, "Geo");
        assert_eq!(doc.info.description.as_deref(), Some("Custom"));
    }
}
