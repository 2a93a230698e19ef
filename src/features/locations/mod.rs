//! Country → province → city → district hierarchy.
//!
//! Names are unique among live siblings: countries globally, every other
//! level within its parent. Parents must exist (soft-deleted parents count).
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/admin/location/{level}` | Paged list with sort and filters |
//! | OPTIONS | `/api/admin/location/{level}` | Supported bulk actions, sorts and filters |
//! | GET | `/api/admin/location/{level}/create` | Parent choices for the create form |
//! | POST | `/api/admin/location/{level}` | Store |
//! | GET | `/api/admin/location/{level}/{id}/edit` | Record plus form options |
//! | PUT | `/api/admin/location/{level}/{id}` | Partial update |
//! | POST | `/api/admin/location/{level}/bulk` | Delete, restore, force delete, (de)activate |
//!
//! `{level}` is one of `countries`, `provinces`, `cities`, `districts`.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod rules;
pub mod services;

pub use services::LocationServices;
