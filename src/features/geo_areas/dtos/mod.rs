mod geo_area_dto;

pub use geo_area_dto::*;
