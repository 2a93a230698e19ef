mod city_dto;
mod country_dto;
mod district_dto;
mod form_dto;
mod province_dto;

pub use city_dto::*;
pub use country_dto::*;
pub use district_dto::*;
pub use form_dto::*;
pub use province_dto::*;
