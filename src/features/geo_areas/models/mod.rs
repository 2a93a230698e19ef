mod geo_area;

pub use geo_area::{GeoArea, GeoAreaRelation};
