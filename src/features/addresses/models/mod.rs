mod address;
mod location_pointer;
mod owner;

pub use address::Address;
pub use location_pointer::LocationPointer;
pub use owner::{Owner, OwnerRelation};
