use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

/// Every entity managed by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Country,
    Province,
    City,
    District,
    GeoArea,
    Address,
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Country,
        EntityKind::Province,
        EntityKind::City,
        EntityKind::District,
        EntityKind::GeoArea,
        EntityKind::Address,
        EntityKind::Location,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EntityKind::Country => "country",
            EntityKind::Province => "province",
            EntityKind::City => "city",
            EntityKind::District => "district",
            EntityKind::GeoArea => "geo_area",
            EntityKind::Address => "address",
            EntityKind::Location => "location",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Country => "Country",
            EntityKind::Province => "Province",
            EntityKind::City => "City",
            EntityKind::District => "District",
            EntityKind::GeoArea => "Geo area",
            EntityKind::Address => "Address",
            EntityKind::Location => "Location",
        }
    }
}

/// Lifecycle phase an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Stored,
    Updated,
    Deleted,
    Restored,
    ForceDeleted,
}

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 5] = [
        LifecyclePhase::Stored,
        LifecyclePhase::Updated,
        LifecyclePhase::Deleted,
        LifecyclePhase::Restored,
        LifecyclePhase::ForceDeleted,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LifecyclePhase::Stored => "stored",
            LifecyclePhase::Updated => "updated",
            LifecyclePhase::Deleted => "deleted",
            LifecyclePhase::Restored => "restored",
            LifecyclePhase::ForceDeleted => "force_deleted",
        }
    }
}

/// A lifecycle change of one entity.
///
/// `payload` is the entity as it looks after the change (before, for a
/// force delete). `changes` is only set for updates and maps each changed
/// field to its new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub entity: EntityKind,
    pub phase: LifecyclePhase,
    pub entity_id: Uuid,
    pub payload: Value,
    pub changes: Option<Map<String, Value>>,
    pub occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new<T: Serialize>(
        entity: EntityKind,
        phase: LifecyclePhase,
        entity_id: Uuid,
        data: &T,
    ) -> Self {
        Self {
            entity,
            phase,
            entity_id,
            payload: serde_json::to_value(data).unwrap_or(Value::Null),
            changes: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_changes(mut self, changes: Map<String, Value>) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Stable dotted key, e.g. `country.updated`
    pub fn key(&self) -> String {
        format!("{}.{}", self.entity.key(), self.phase.key())
    }
}

/// Fields whose value differs between two serialized snapshots of an
/// entity, mapped to their new value. Bookkeeping timestamps are ignored.
pub fn changed_fields(before: &Value, after: &Value) -> Map<String, Value> {
    const IGNORED: &[&str] = &["updated_at", "created_at"];

    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return Map::new();
    };

    after
        .iter()
        .filter(|(key, _)| !IGNORED.contains(&key.as_str()))
        .filter(|(key, value)| before.get(key.as_str()) != Some(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_key() {
        let event = LifecycleEvent::new(
            EntityKind::Country,
            LifecyclePhase::Updated,
            Uuid::nil(),
            &json!({"name": "Iran"}),
        );
        assert_eq!(event.key(), "country.updated");

        let event = LifecycleEvent::new(
            EntityKind::GeoArea,
            LifecyclePhase::ForceDeleted,
            Uuid::nil(),
            &json!({}),
        );
        assert_eq!(event.key(), "geo_area.force_deleted");
    }

    #[test]
    fn test_changed_fields_only_reports_differences() {
        let before = json!({"name": "Tehran", "status": true, "updated_at": "a"});
        let after = json!({"name": "Tehran", "status": false, "updated_at": "b"});

        let changes = changed_fields(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["status"], json!(false));
    }

    #[test]
    fn test_changed_fields_same_snapshot_is_empty() {
        let snapshot = json!({"name": "Shiraz", "keywords": ["fars"]});
        assert!(changed_fields(&snapshot, &snapshot).is_empty());
        assert!(changed_fields(&json!(null), &snapshot).is_empty());
    }
}
