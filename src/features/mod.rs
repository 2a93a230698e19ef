pub mod addresses;
pub mod events;
pub mod geo_areas;
pub mod locations;
