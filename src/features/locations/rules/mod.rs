pub mod directory;
pub mod graph;
pub mod unique_name;

pub use directory::{LocationDirectory, NameScope, PgLocationDirectory};
pub use unique_name::UniqueName;
