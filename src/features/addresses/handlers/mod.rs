pub mod address_handler;
pub mod location_handler;

pub use address_handler::*;
pub use location_handler::*;
