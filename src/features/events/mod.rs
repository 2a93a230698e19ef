//! Lifecycle events raised by every store, update, delete, restore and
//! force delete, plus the registry describing them.

pub mod bus;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod routes;
pub mod subscriber;

pub use bus::EventBus;
pub use models::{EntityKind, LifecycleEvent, LifecyclePhase};
