use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::TableNames;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::addresses::dtos::{
    CreateLocationDto, LocationEditDto, LocationResponseDto, UpdateLocationDto,
};
use crate::features::addresses::models::{LocationPointer, Owner};
use crate::features::addresses::services::owners::OwnerTable;
use crate::features::events::{EntityKind, EventBus, LifecyclePhase};
use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::LocationKind;
use crate::features::locations::rules::graph::check_placement;
use crate::features::locations::rules::{LocationDirectory, PgLocationDirectory};
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto};
use crate::shared::lifecycle::SoftDeletes;
use crate::shared::listing::{fetch_page, ListSpec};
use crate::shared::query::{ListQuery, SortSpec};
use crate::shared::validation::FieldErrors;

pub struct LocationService {
    pool: PgPool,
    owners: OwnerTable,
    directory: Arc<PgLocationDirectory>,
    rows: SoftDeletes<LocationPointer>,
}

impl LocationService {
    pub const SORTABLE: &'static [&'static str] = &["status", "created_at", "updated_at"];
    pub const FILTERS: &'static [&'static str] =
        &["status", "trashed", "country_id", "province_id", "city_id"];

    pub fn new(
        pool: PgPool,
        tables: Arc<TableNames>,
        directory: Arc<PgLocationDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        let rows = SoftDeletes::new(pool.clone(), &tables.locations, EntityKind::Location, events);
        Self {
            pool,
            owners: OwnerTable::new(&tables.location_relations, "location_id"),
            directory,
            rows,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<LocationResponseDto>, i64)> {
        let parent = query
            .filter_city_id
            .map(|id| ("city_id", id))
            .or(query.filter_province_id.map(|id| ("province_id", id)))
            .or(query.filter_country_id.map(|id| ("country_id", id)));
        let spec = ListSpec {
            table: self.rows.table(),
            sortable: Self::SORTABLE,
            filters: Self::FILTERS,
            default_sort: SortSpec::desc("created_at"),
            search: None,
            parent,
        };
        let (rows, total) = fetch_page::<LocationPointer>(&self.pool, &spec, query).await?;

        let ids: Vec<Uuid> = rows.iter().map(|l| l.id).collect();
        let mut owners = self.owners.owners_of(&self.pool, &ids).await?;
        let items = rows
            .into_iter()
            .map(|location| {
                let owner = owners.remove(&location.id);
                LocationResponseDto::new(location, owner)
            })
            .collect();
        Ok((items, total))
    }

    pub async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<LocationResponseDto>> {
        let rows: Vec<LocationPointer> = self
            .owners
            .owned_by(&self.pool, self.rows.table(), owner)
            .await?;
        Ok(rows
            .into_iter()
            .map(|location| LocationResponseDto::new(location, Some(owner.clone())))
            .collect())
    }

    pub async fn form(&self) -> Result<LocationFormDto> {
        let parents = self.directory.options(LocationKind::Country, None).await?;
        Ok(LocationFormDto {
            parent_field: Some("country_id".to_string()),
            parents,
        })
    }

    pub async fn edit(&self, id: Uuid) -> Result<LocationEditDto> {
        let location = self.rows.find(id).await?;
        let owner = self.owners.owner_of(&self.pool, id).await?;
        Ok(LocationEditDto {
            record: LocationResponseDto::new(location, owner),
            form: self.form().await?,
        })
    }

    pub async fn create(&self, dto: CreateLocationDto) -> Result<LocationResponseDto> {
        check_create(self.directory.as_ref(), &dto).await?.into_result()?;
        let Some(country_id) = dto.country_id else {
            return Err(AppError::FieldValidation(FieldErrors::single(
                "country_id",
                "The country_id field is required.",
            )));
        };

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let query = format!(
            "INSERT INTO {} (id, country_id, province_id, city_id, district_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
            self.rows.table()
        );
        let location = sqlx::query_as::<_, LocationPointer>(&query)
            .bind(Uuid::now_v7())
            .bind(country_id)
            .bind(dto.province_id)
            .bind(dto.city_id)
            .bind(dto.district_id)
            .bind(dto.status.unwrap_or(true))
            .fetch_one(&mut *tx)
            .await
            .map_err(handle_db_error)?;

        let owner = dto.owner();
        self.owners.attach(&mut tx, location.id, &owner).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Location {} created for {} {}",
            location.id,
            owner.owner_type,
            owner.owner_id
        );
        self.rows.emit(LifecyclePhase::Stored, &location);
        Ok(LocationResponseDto::new(location, Some(owner)))
    }

    pub async fn update(&self, id: Uuid, dto: UpdateLocationDto) -> Result<LocationResponseDto> {
        let before = self.rows.find(id).await?;
        check_update(self.directory.as_ref(), &dto).await?.into_result()?;

        let query = format!(
            "UPDATE {} SET country_id = COALESCE($2, country_id), \
             province_id = CASE WHEN $3 THEN $4 ELSE province_id END, \
             city_id = CASE WHEN $5 THEN $6 ELSE city_id END, \
             district_id = CASE WHEN $7 THEN $8 ELSE district_id END, \
             status = COALESCE($9, status), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.rows.table()
        );
        let after = sqlx::query_as::<_, LocationPointer>(&query)
            .bind(id)
            .bind(dto.country_id)
            .bind(dto.province_id.is_some())
            .bind(dto.province_id.flatten())
            .bind(dto.city_id.is_some())
            .bind(dto.city_id.flatten())
            .bind(dto.district_id.is_some())
            .bind(dto.district_id.flatten())
            .bind(dto.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Location with id {} not found", id)))?;

        self.rows.emit_update(&before, &after);
        let owner = self.owners.owner_of(&self.pool, id).await?;
        Ok(LocationResponseDto::new(after, owner))
    }

    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        self.rows.bulk(dto).await
    }
}

pub async fn check_create<D>(directory: &D, dto: &CreateLocationDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    check_placement(directory, &mut errors, &dto.refs(), true).await?;
    Ok(errors)
}

pub async fn check_update<D>(directory: &D, dto: &UpdateLocationDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = FieldErrors::default();
    check_placement(directory, &mut errors, &dto.refs(), false).await?;
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryDirectory;
    use serde_json::json;

    #[tokio::test]
    async fn test_levels_checked_independently() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);
        let unrelated_city = directory.add(LocationKind::City, "Yerevan", None);

        let dto: CreateLocationDto = serde_json::from_value(json!({
            "owner_type": "App\\Models\\Shop",
            "owner_id": "17",
            "country_id": country,
            "city_id": unrelated_city
        }))
        .unwrap();
        assert!(check_create(&directory, &dto).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_owner_type_and_missing_country() {
        let directory = InMemoryDirectory::new();
        let dto: CreateLocationDto = serde_json::from_value(json!({
            "owner_type": "shop; drop",
            "owner_id": ""
        }))
        .unwrap();

        let errors = check_create(&directory, &dto).await.unwrap();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["country_id", "owner_id", "owner_type"]
        );
    }

    #[tokio::test]
    async fn test_update_null_city_means_clear() {
        let directory = InMemoryDirectory::new();
        let cleared: UpdateLocationDto = serde_json::from_value(json!({"city_id": null})).unwrap();
        let untouched: UpdateLocationDto = serde_json::from_value(json!({})).unwrap();

        assert_eq!(cleared.city_id, Some(None));
        assert_eq!(untouched.city_id, None);
        assert!(check_update(&directory, &cleared).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_sets_checked_against_directory() {
        let directory = InMemoryDirectory::new();
        let dto: UpdateLocationDto =
            serde_json::from_value(json!({"province_id": Uuid::now_v7()})).unwrap();
        assert!(check_update(&directory, &dto).await.unwrap().has("province_id"));
    }
}
