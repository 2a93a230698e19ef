pub mod address_service;
pub mod location_service;
pub mod owners;

pub use address_service::AddressService;
pub use location_service::LocationService;
