use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::TableNames;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::events::{EntityKind, EventBus, LifecyclePhase};
use crate::features::locations::dtos::{
    CreateProvinceDto, LocationFormDto, ProvinceEditDto, ProvinceResponseDto, UpdateProvinceDto,
};
use crate::features::locations::models::{LocationKind, Province};
use crate::features::locations::rules::graph::check_exists;
use crate::features::locations::rules::{LocationDirectory, PgLocationDirectory, UniqueName};
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto};
use crate::shared::lifecycle::SoftDeletes;
use crate::shared::listing::{fetch_page, ListSpec};
use crate::shared::query::{ListQuery, SortSpec};
use crate::shared::validation::{FieldErrors, ValidationContext};

pub struct ProvinceService {
    pool: PgPool,
    directory: Arc<PgLocationDirectory>,
    rows: SoftDeletes<Province>,
}

impl ProvinceService {
    pub const SORTABLE: &'static [&'static str] =
        &["name", "country_id", "status", "created_at", "updated_at"];
    pub const FILTERS: &'static [&'static str] = &["name", "status", "trashed", "country_id"];

    pub fn new(
        pool: PgPool,
        tables: Arc<TableNames>,
        directory: Arc<PgLocationDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        let rows = SoftDeletes::new(pool.clone(), &tables.provinces, EntityKind::Province, events);
        Self {
            pool,
            directory,
            rows,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<ProvinceResponseDto>, i64)> {
        let spec = ListSpec {
            table: self.rows.table(),
            sortable: Self::SORTABLE,
            filters: Self::FILTERS,
            default_sort: SortSpec::asc("name"),
            search: Some("name"),
            parent: query.filter_country_id.map(|id| ("country_id", id)),
        };
        let (rows, total) = fetch_page::<Province>(&self.pool, &spec, query).await?;
        Ok((rows.into_iter().map(ProvinceResponseDto::from).collect(), total))
    }

    /// Provinces always choose among every country
    pub async fn form(&self) -> Result<LocationFormDto> {
        let parents = self
            .directory
            .options(LocationKind::Country, None)
            .await?;
        Ok(LocationFormDto {
            parent_field: Some("country_id".to_string()),
            parents,
        })
    }

    pub async fn edit(&self, id: Uuid) -> Result<ProvinceEditDto> {
        let province = self.rows.find(id).await?;
        let form = self.form().await?;
        Ok(ProvinceEditDto {
            record: province.into(),
            form,
        })
    }

    pub async fn create(&self, dto: CreateProvinceDto) -> Result<ProvinceResponseDto> {
        check_create(self.directory.as_ref(), &dto).await?.into_result()?;

        let query = format!(
            "INSERT INTO {} (id, country_id, name, status) VALUES ($1, $2, $3, $4) RETURNING *",
            self.rows.table()
        );
        let province = sqlx::query_as::<_, Province>(&query)
            .bind(Uuid::now_v7())
            .bind(dto.country_id)
            .bind(&dto.name)
            .bind(dto.status.unwrap_or(true))
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        tracing::info!("Province created: {} ({})", province.name, province.id);
        self.rows.emit(LifecyclePhase::Stored, &province);
        Ok(province.into())
    }

    pub async fn update(&self, id: Uuid, dto: UpdateProvinceDto) -> Result<ProvinceResponseDto> {
        let before = self.rows.find(id).await?;
        check_update(self.directory.as_ref(), &before, &dto)
            .await?
            .into_result()?;

        let query = format!(
            "UPDATE {} SET country_id = COALESCE($2, country_id), name = COALESCE($3, name), \
             status = COALESCE($4, status), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.rows.table()
        );
        let after = sqlx::query_as::<_, Province>(&query)
            .bind(id)
            .bind(dto.country_id)
            .bind(&dto.name)
            .bind(dto.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Province with id {} not found", id)))?;

        self.rows.emit_update(&before, &after);
        Ok(after.into())
    }

    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        self.rows.bulk(dto).await
    }
}

pub async fn check_create<D>(directory: &D, dto: &CreateProvinceDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    check_exists(
        directory,
        &mut errors,
        "country_id",
        LocationKind::Country,
        dto.country_id,
    )
    .await?;

    let ctx = ValidationContext::from_payload(dto);
    UniqueName::new(LocationKind::Province)
        .validate(directory, &mut errors, "name", &dto.name, &ctx)
        .await?;
    Ok(errors)
}

/// Re-checks the name whenever it or the parent changes, against the
/// parent the row ends up under
pub async fn check_update<D>(
    directory: &D,
    current: &Province,
    dto: &UpdateProvinceDto,
) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    if let Some(parent_id) = dto.country_id {
        check_exists(
            directory,
            &mut errors,
            "country_id",
            LocationKind::Country,
            parent_id,
        )
        .await?;
    }

    if dto.name.is_some() || dto.country_id.is_some() {
        let name = dto.name.as_deref().unwrap_or(&current.name);
        let ctx =
            ValidationContext::from_payload(dto).or_insert("country_id", current.country_id);
        UniqueName::new(LocationKind::Province)
            .ignore(current.id)
            .validate(directory, &mut errors, "name", name, &ctx)
            .await?;
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryDirectory;
    use chrono::Utc;

    fn create_dto(parent_id: Uuid, name: &str) -> CreateProvinceDto {
        CreateProvinceDto {
            country_id: parent_id,
            name: name.to_string(),
            status: None,
        }
    }

    fn stored(directory: &InMemoryDirectory, parent_id: Uuid, name: &str) -> Province {
        Province {
            id: directory.add(LocationKind::Province, name, Some(parent_id)),
            country_id: parent_id,
            name: name.to_string(),
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_same_name_same_parent_fails_different_parent_succeeds() {
        let directory = InMemoryDirectory::new();
        let parent_a = directory.add(LocationKind::Country, "A", None);
        let parent_b = directory.add(LocationKind::Country, "B", None);
        stored(&directory, parent_a, "Tehran");

        let errors = check_create(&directory, &create_dto(parent_a, "Tehran")).await.unwrap();
        assert!(errors.has("name"));

        let errors = check_create(&directory, &create_dto(parent_b, "Tehran")).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_parent_reported_on_parent_field() {
        let directory = InMemoryDirectory::new();
        let errors = check_create(&directory, &create_dto(Uuid::now_v7(), "Tehran"))
            .await
            .unwrap();
        assert!(errors.has("country_id"));
        assert!(!errors.has("name"));
    }

    #[tokio::test]
    async fn test_rename_to_own_name_passes() {
        let directory = InMemoryDirectory::new();
        let parent = directory.add(LocationKind::Country, "A", None);
        let current = stored(&directory, parent, "Tehran");
        stored(&directory, parent, "Other");

        let dto = UpdateProvinceDto {
            name: Some("Tehran".to_string()),
            ..Default::default()
        };
        let errors = check_update(&directory, &current, &dto).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_moving_into_parent_with_same_name_fails() {
        let directory = InMemoryDirectory::new();
        let parent_a = directory.add(LocationKind::Country, "A", None);
        let parent_b = directory.add(LocationKind::Country, "B", None);
        let current = stored(&directory, parent_a, "Tehran");
        stored(&directory, parent_b, "Tehran");

        let dto = UpdateProvinceDto {
            country_id: Some(parent_b),
            ..Default::default()
        };
        let errors = check_update(&directory, &current, &dto).await.unwrap();
        assert!(errors.has("name"));
    }
}
