pub mod city_handler;
pub mod country_handler;
pub mod district_handler;
pub mod province_handler;

pub use city_handler::*;
pub use country_handler::*;
pub use district_handler::*;
pub use province_handler::*;
