mod lifecycle_event;

pub use lifecycle_event::{changed_fields, EntityKind, LifecycleEvent, LifecyclePhase};
