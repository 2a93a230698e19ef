//! Static metadata describing every lifecycle event the service emits.
//!
//! External audit and notification subscribers key off [`EventMeta::key`];
//! the title, description, icon and tags are presentation hints for them.

use serde::Serialize;
use utoipa::ToSchema;

use super::models::{EntityKind, LifecyclePhase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EventMeta {
    pub key: String,
    pub entity: EntityKind,
    pub phase: LifecyclePhase,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub tags: Vec<String>,
}

fn icon(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Country => "ti ti-flag",
        EntityKind::Province => "ti ti-map",
        EntityKind::City => "ti ti-building-community",
        EntityKind::District => "ti ti-map-pin",
        EntityKind::GeoArea => "ti ti-world",
        EntityKind::Address => "ti ti-address-book",
        EntityKind::Location => "ti ti-current-location",
    }
}

fn verb(phase: LifecyclePhase) -> &'static str {
    match phase {
        LifecyclePhase::Stored => "created",
        LifecyclePhase::Updated => "updated",
        LifecyclePhase::Deleted => "moved to trash",
        LifecyclePhase::Restored => "restored from trash",
        LifecyclePhase::ForceDeleted => "permanently deleted",
    }
}

/// Metadata of one (entity, phase) pair
pub fn describe(entity: EntityKind, phase: LifecyclePhase) -> EventMeta {
    let title = format!("{} {}", entity.label(), verb(phase));
    let description = format!(
        "Raised after one {} record is {}.",
        entity.label().to_lowercase(),
        verb(phase)
    );

    let mut tags = vec![
        "location".to_string(),
        entity.key().to_string(),
        phase.key().to_string(),
    ];
    if matches!(phase, LifecyclePhase::Deleted | LifecyclePhase::ForceDeleted) {
        tags.push("destructive".to_string());
    }

    EventMeta {
        key: format!("{}.{}", entity.key(), phase.key()),
        entity,
        phase,
        title,
        description,
        icon: icon(entity).to_string(),
        tags,
    }
}

/// Every event the service can emit, grouped by entity
pub fn all() -> Vec<EventMeta> {
    EntityKind::ALL
        .iter()
        .flat_map(|entity| {
            LifecyclePhase::ALL
                .iter()
                .map(move |phase| describe(*entity, *phase))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_covers_every_pair_with_unique_keys() {
        let events = all();
        assert_eq!(events.len(), EntityKind::ALL.len() * LifecyclePhase::ALL.len());

        let keys: HashSet<_> = events.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys.len(), events.len());
    }

    #[test]
    fn test_describe_country_updated() {
        let meta = describe(EntityKind::Country, LifecyclePhase::Updated);
        assert_eq!(meta.key, "country.updated");
        assert_eq!(meta.title, "Country updated");
        assert_eq!(meta.icon, "ti ti-flag");
        assert_eq!(meta.tags, vec!["location", "country", "updated"]);
    }

    #[test]
    fn test_destructive_tag() {
        let meta = describe(EntityKind::District, LifecyclePhase::ForceDeleted);
        assert!(meta.tags.iter().any(|t| t == "destructive"));
        assert_eq!(meta.title, "District permanently deleted");
    }
}
