use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::EventBus;
use super::registry;

/// Spawns a task writing every lifecycle event to the log.
///
/// The task ends when the bus is dropped.
pub fn spawn_audit_logger(bus: &Arc<EventBus>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let meta = registry::describe(event.entity, event.phase);
                    let changed: Vec<&str> = event
                        .changes
                        .as_ref()
                        .map(|c| c.keys().map(String::as_str).collect())
                        .unwrap_or_default();
                    tracing::info!(
                        target: "audit",
                        event = %meta.key,
                        entity_id = %event.entity_id,
                        changed = ?changed,
                        "{}",
                        meta.title
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "audit", "Audit logger lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::events::{EntityKind, LifecycleEvent, LifecyclePhase};
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn audit_logger_drains_then_stops_when_bus_dropped() {
        let bus = Arc::new(EventBus::new(4));
        let handle = spawn_audit_logger(&bus);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(LifecycleEvent::new(
            EntityKind::Country,
            LifecyclePhase::Stored,
            Uuid::now_v7(),
            &json!({"name": "Iran"}),
        ));
        drop(bus);

        tokio_test::assert_ok!(handle.await);
    }
}
