pub mod bulk;
pub mod constants;
pub mod lifecycle;
pub mod listing;
pub mod query;
pub mod test_helpers;
pub mod types;
pub mod validation;
