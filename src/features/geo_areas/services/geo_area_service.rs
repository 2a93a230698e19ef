use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::config::TableNames;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::events::models::changed_fields;
use crate::features::events::{EntityKind, EventBus, LifecycleEvent, LifecyclePhase};
use crate::features::geo_areas::dtos::{
    CreateGeoAreaDto, GeoAreaEditDto, GeoAreaResponseDto, UpdateGeoAreaDto,
};
use crate::features::geo_areas::models::{GeoArea, GeoAreaRelation};
use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::{LocationKind, LocationRefs};
use crate::features::locations::rules::graph::check_relations;
use crate::features::locations::rules::{LocationDirectory, PgLocationDirectory};
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto};
use crate::shared::lifecycle::{Applied, SoftDeletes};
use crate::shared::listing::{fetch_page, ListSpec};
use crate::shared::query::{ListQuery, SortSpec};
use crate::shared::validation::{check_translations, FieldErrors};

pub struct GeoAreaService {
    pool: PgPool,
    relations_table: String,
    directory: Arc<PgLocationDirectory>,
    events: Arc<EventBus>,
    rows: SoftDeletes<GeoArea>,
}

impl GeoAreaService {
    pub const SORTABLE: &'static [&'static str] = &["name", "status", "created_at", "updated_at"];
    pub const FILTERS: &'static [&'static str] = &["name", "status", "trashed"];

    pub fn new(
        pool: PgPool,
        tables: Arc<TableNames>,
        directory: Arc<PgLocationDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        let rows = SoftDeletes::new(
            pool.clone(),
            &tables.geo_areas,
            EntityKind::GeoArea,
            events.clone(),
        );
        Self {
            pool,
            relations_table: tables.geo_area_relations.clone(),
            directory,
            events,
            rows,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<GeoAreaResponseDto>, i64)> {
        let spec = ListSpec {
            table: self.rows.table(),
            sortable: Self::SORTABLE,
            filters: Self::FILTERS,
            default_sort: SortSpec::desc("created_at"),
            search: Some("name::text"),
            parent: None,
        };
        let (areas, total) = fetch_page::<GeoArea>(&self.pool, &spec, query).await?;

        let ids: Vec<Uuid> = areas.iter().map(|a| a.id).collect();
        let mut members = self.relations_of(&ids).await?;
        let items = areas
            .into_iter()
            .map(|area| {
                let locations = members.remove(&area.id).unwrap_or_default();
                GeoAreaResponseDto::new(area, locations)
            })
            .collect();
        Ok((items, total))
    }

    /// Top-level choices; lower levels come from the hierarchy forms
    pub async fn form(&self) -> Result<LocationFormDto> {
        let parents = self.directory.options(LocationKind::Country, None).await?;
        Ok(LocationFormDto {
            parent_field: Some("locations.*.country_id".to_string()),
            parents,
        })
    }

    pub async fn edit(&self, id: Uuid) -> Result<GeoAreaEditDto> {
        let record = self.load(self.rows.find(id).await?).await?;
        Ok(GeoAreaEditDto {
            record,
            form: self.form().await?,
        })
    }

    pub async fn create(&self, dto: CreateGeoAreaDto) -> Result<GeoAreaResponseDto> {
        check_create(self.directory.as_ref(), &dto).await?.into_result()?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let query = format!(
            "INSERT INTO {} (id, name, description, status) VALUES ($1, $2, $3, $4) RETURNING *",
            self.rows.table()
        );
        let area = sqlx::query_as::<_, GeoArea>(&query)
            .bind(Uuid::now_v7())
            .bind(sqlx::types::Json(&dto.name))
            .bind(dto.description.as_ref().map(sqlx::types::Json))
            .bind(dto.status.unwrap_or(true))
            .fetch_one(&mut *tx)
            .await
            .map_err(handle_db_error)?;

        self.replace_relations(&mut tx, area.id, &dto.locations).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Geo area created: {} with {} locations",
            area.id,
            dto.locations.len()
        );
        let created = GeoAreaResponseDto::new(area, dto.locations);
        self.events.publish(LifecycleEvent::new(
            EntityKind::GeoArea,
            LifecyclePhase::Stored,
            created.id,
            &created,
        ));
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, dto: UpdateGeoAreaDto) -> Result<GeoAreaResponseDto> {
        let before = self.load(self.rows.find(id).await?).await?;
        check_update(self.directory.as_ref(), &dto).await?.into_result()?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let query = format!(
            "UPDATE {} SET name = COALESCE($2, name), \
             description = CASE WHEN $3 THEN $4 ELSE description END, \
             status = COALESCE($5, status), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.rows.table()
        );
        let area = sqlx::query_as::<_, GeoArea>(&query)
            .bind(id)
            .bind(dto.name.as_ref().map(sqlx::types::Json))
            .bind(dto.description.is_some())
            .bind(dto.description.as_ref().and_then(Option::as_ref).map(sqlx::types::Json))
            .bind(dto.status)
            .fetch_optional(&mut *tx)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Geo area with id {} not found", id)))?;

        let locations = match dto.locations {
            Some(locations) => {
                self.replace_relations(&mut tx, id, &locations).await?;
                locations
            }
            None => before.locations.clone(),
        };
        tx.commit().await.map_err(AppError::Database)?;

        let after = GeoAreaResponseDto::new(area, locations);
        let changes = changed_fields(
            &serde_json::to_value(&before).unwrap_or_default(),
            &serde_json::to_value(&after).unwrap_or_default(),
        );
        self.events.publish(
            LifecycleEvent::new(EntityKind::GeoArea, LifecyclePhase::Updated, id, &after)
                .with_changes(changes),
        );
        Ok(after)
    }

    /// Members are read before the writes: a force delete cascades them away
    /// (`ON DELETE CASCADE`) and the event still has to list them.
    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        let members = self.relations_of(&dto.ids).await?;
        self.rows
            .bulk_with(dto, |applied| {
                let locations = members.get(&applied.row.id).cloned().unwrap_or_default();
                self.events.publish(geo_area_event(applied, locations));
            })
            .await
    }

    async fn load(&self, area: GeoArea) -> Result<GeoAreaResponseDto> {
        let locations = self
            .relations_of(&[area.id])
            .await?
            .remove(&area.id)
            .unwrap_or_default();
        Ok(GeoAreaResponseDto::new(area, locations))
    }

    async fn relations_of(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<LocationRefs>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT * FROM {} WHERE geo_area_id = ANY($1) ORDER BY id ASC",
            self.relations_table
        );
        let relations = sqlx::query_as::<_, GeoAreaRelation>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load geo area relations: {:?}", e);
                AppError::Database(e)
            })?;

        let mut grouped: HashMap<Uuid, Vec<LocationRefs>> = HashMap::new();
        for relation in relations {
            grouped
                .entry(relation.geo_area_id)
                .or_default()
                .push(relation.location);
        }
        Ok(grouped)
    }

    async fn replace_relations(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        geo_area_id: Uuid,
        locations: &[LocationRefs],
    ) -> Result<()> {
        let delete = format!("DELETE FROM {} WHERE geo_area_id = $1", self.relations_table);
        sqlx::query(&delete)
            .bind(geo_area_id)
            .execute(&mut **tx)
            .await
            .map_err(handle_db_error)?;

        let insert = format!(
            "INSERT INTO {} (id, geo_area_id, country_id, province_id, city_id, district_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            self.relations_table
        );
        for location in locations {
            sqlx::query(&insert)
                .bind(Uuid::now_v7())
                .bind(geo_area_id)
                .bind(location.country_id)
                .bind(location.province_id)
                .bind(location.city_id)
                .bind(location.district_id)
                .execute(&mut **tx)
                .await
                .map_err(handle_db_error)?;
        }
        Ok(())
    }
}

/// Lifecycle event for a bulk write, carrying the response shape with members
pub fn geo_area_event(applied: Applied<GeoArea>, locations: Vec<LocationRefs>) -> LifecycleEvent {
    let id = applied.row.id;
    let after = GeoAreaResponseDto::new(applied.row, locations);
    let event = LifecycleEvent::new(EntityKind::GeoArea, applied.phase, id, &after);

    match applied.before {
        Some(before) => {
            let before = GeoAreaResponseDto::new(before, after.locations.clone());
            event.with_changes(changed_fields(
                &serde_json::to_value(&before).unwrap_or_default(),
                &serde_json::to_value(&after).unwrap_or_default(),
            ))
        }
        None => event,
    }
}

pub async fn check_create<D>(directory: &D, dto: &CreateGeoAreaDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = FieldErrors::default();
    check_translations(&mut errors, "name", &dto.name, true);
    if let Some(description) = &dto.description {
        check_translations(&mut errors, "description", description, false);
    }
    check_relations(directory, &mut errors, "locations", &dto.locations).await?;
    Ok(errors)
}

pub async fn check_update<D>(directory: &D, dto: &UpdateGeoAreaDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = FieldErrors::default();
    if let Some(name) = &dto.name {
        check_translations(&mut errors, "name", name, true);
    }
    if let Some(Some(description)) = &dto.description {
        check_translations(&mut errors, "description", description, false);
    }
    if let Some(locations) = &dto.locations {
        check_relations(directory, &mut errors, "locations", locations).await?;
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryDirectory;
    use serde_json::json;

    #[tokio::test]
    async fn test_identical_tuples_fail_on_locations() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Rasht", None);

        let dto: CreateGeoAreaDto = serde_json::from_value(json!({
            "name": {"en": "Caspian coast"},
            "locations": [{"city_id": city}, {"city_id": city}]
        }))
        .unwrap();

        let errors = check_create(&directory, &dto).await.unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["locations"]);
    }

    #[tokio::test]
    async fn test_distinct_tuples_succeed() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);
        let city = directory.add(LocationKind::City, "Rasht", None);

        let dto: CreateGeoAreaDto = serde_json::from_value(json!({
            "name": {"en": "Caspian coast", "fa": "ساحل خزر"},
            "locations": [{"city_id": city}, {"country_id": country, "city_id": city}]
        }))
        .unwrap();

        assert!(check_create(&directory, &dto).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_name_is_required() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);

        let dto: CreateGeoAreaDto = serde_json::from_value(json!({
            "name": {"en": "  "},
            "locations": [{"country_id": country}]
        }))
        .unwrap();

        let errors = check_create(&directory, &dto).await.unwrap();
        assert!(errors.has("name"));
    }

    #[tokio::test]
    async fn test_update_without_locations_keeps_set_unchecked() {
        let directory = InMemoryDirectory::new();
        let dto = UpdateGeoAreaDto {
            status: Some(false),
            ..Default::default()
        };
        assert!(check_update(&directory, &dto).await.unwrap().is_empty());

        let dto = UpdateGeoAreaDto {
            locations: Some(vec![]),
            ..Default::default()
        };
        assert!(check_update(&directory, &dto).await.unwrap().has("locations"));
    }

    #[tokio::test]
    async fn test_update_null_description_clears_unchecked() {
        let directory = InMemoryDirectory::new();
        let dto: UpdateGeoAreaDto = serde_json::from_value(json!({"description": null})).unwrap();

        assert_eq!(dto.description, Some(None));
        assert!(check_update(&directory, &dto).await.unwrap().is_empty());

        let dto: UpdateGeoAreaDto = serde_json::from_value(json!({})).unwrap();
        assert_eq!(dto.description, None);
    }

    fn area(id: Uuid, status: bool) -> GeoArea {
        GeoArea {
            id,
            name: json!({"en": "Caspian coast"}),
            description: None,
            status,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_force_deleted_event_lists_members() {
        let id = Uuid::now_v7();
        let city = Uuid::now_v7();
        let members = vec![LocationRefs {
            city_id: Some(city),
            ..Default::default()
        }];

        let applied = Applied::new(LifecyclePhase::ForceDeleted, area(id, true));
        let event = geo_area_event(applied, members);

        assert_eq!(event.key(), "geo_area.force_deleted");
        assert_eq!(event.entity_id, id);
        assert_eq!(event.payload["locations"][0]["city_id"], json!(city));
        assert!(event.changes.is_none());
    }

    #[test]
    fn test_deactivated_event_reports_status_change() {
        let id = Uuid::now_v7();
        let applied = Applied {
            phase: LifecyclePhase::Updated,
            before: Some(area(id, true)),
            row: area(id, false),
        };

        let event = geo_area_event(applied, vec![]);
        let changes = event.changes.unwrap();
        assert_eq!(changes.get("status"), Some(&json!(false)));
        assert!(!changes.contains_key("locations"));
        assert!(event.payload["locations"].as_array().unwrap().is_empty());
    }
}
