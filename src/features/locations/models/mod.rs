mod city;
mod country;
mod district;
mod location_kind;
mod location_refs;
mod province;

pub use city::City;
pub use country::Country;
pub use district::District;
pub use location_kind::LocationKind;
pub use location_refs::LocationRefs;
pub use province::Province;
