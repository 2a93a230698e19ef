mod address_dto;
mod location_dto;

pub use address_dto::*;
pub use location_dto::*;
