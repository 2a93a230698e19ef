//! Addresses and location pointers attached to host records.
//!
//! Both are owned polymorphically through a relation table holding
//! `(owner_type, owner_id)`; the record and its owner row are written in one
//! transaction. `country_id` is required, lower levels are optional and each
//! is checked for existence on its own.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{AddressService, LocationService};
