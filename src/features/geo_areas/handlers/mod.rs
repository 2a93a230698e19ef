pub mod geo_area_handler;

pub use geo_area_handler::*;
