/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// PAYLOAD ALLOW-LISTS
// =============================================================================

/// Keys accepted inside an address `address` object
pub const ADDRESS_LINE_KEYS: &[&str] = &["blvd", "street", "alley", "number", "floor", "unit"];

/// Keys accepted inside an address `info` object
pub const ADDRESS_INFO_KEYS: &[&str] = &["mobile_prefix", "mobile", "name", "landline", "notes"];
