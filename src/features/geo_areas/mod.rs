//! Geo-areas: translated, named regions built from any mix of countries,
//! provinces, cities and districts.
//!
//! A geo-area and its member rows are written in one transaction; an update
//! carrying `locations` replaces the whole member set.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::GeoAreaService;
