pub mod geo_area_service;

pub use geo_area_service::GeoAreaService;
