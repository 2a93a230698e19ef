use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::TableNames;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::events::{EntityKind, EventBus, LifecyclePhase};
use crate::features::locations::dtos::{
    keyword_strings, CreateDistrictDto, DistrictEditDto, DistrictResponseDto, FormQuery,
    LocationFormDto, UpdateDistrictDto,
};
use crate::features::locations::models::{District, LocationKind};
use crate::features::locations::rules::graph::check_exists;
use crate::features::locations::rules::{LocationDirectory, PgLocationDirectory, UniqueName};
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto};
use crate::shared::lifecycle::SoftDeletes;
use crate::shared::listing::{fetch_page, ListSpec};
use crate::shared::query::{ListQuery, SortSpec};
use crate::shared::validation::{check_string_list, FieldErrors, ValidationContext};

pub struct DistrictService {
    pool: PgPool,
    directory: Arc<PgLocationDirectory>,
    rows: SoftDeletes<District>,
}

impl DistrictService {
    pub const SORTABLE: &'static [&'static str] =
        &["name", "subtitle", "city_id", "status", "created_at", "updated_at"];
    pub const FILTERS: &'static [&'static str] = &["name", "status", "trashed", "city_id"];

    pub fn new(
        pool: PgPool,
        tables: Arc<TableNames>,
        directory: Arc<PgLocationDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        let rows = SoftDeletes::new(pool.clone(), &tables.districts, EntityKind::District, events);
        Self {
            pool,
            directory,
            rows,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<DistrictResponseDto>, i64)> {
        let spec = ListSpec {
            table: self.rows.table(),
            sortable: Self::SORTABLE,
            filters: Self::FILTERS,
            default_sort: SortSpec::asc("name"),
            search: Some("name"),
            parent: query.filter_city_id.map(|id| ("city_id", id)),
        };
        let (rows, total) = fetch_page::<District>(&self.pool, &spec, query).await?;
        Ok((rows.into_iter().map(DistrictResponseDto::from).collect(), total))
    }

    pub async fn form(&self, query: &FormQuery) -> Result<LocationFormDto> {
        let parents = self
            .directory
            .options(LocationKind::City, query.filter_province_id)
            .await?;
        Ok(LocationFormDto {
            parent_field: Some("city_id".to_string()),
            parents,
        })
    }

    pub async fn edit(&self, id: Uuid, query: &FormQuery) -> Result<DistrictEditDto> {
        let district = self.rows.find(id).await?;
        let form = self.form(query).await?;
        Ok(DistrictEditDto {
            record: district.into(),
            form,
        })
    }

    pub async fn create(&self, dto: CreateDistrictDto) -> Result<DistrictResponseDto> {
        check_create(self.directory.as_ref(), &dto).await?.into_result()?;

        let keywords = dto.keywords.as_deref().map(keyword_strings).unwrap_or_default();
        let query = format!(
            "INSERT INTO {} (id, city_id, name, subtitle, keywords, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
            self.rows.table()
        );
        let district = sqlx::query_as::<_, District>(&query)
            .bind(Uuid::now_v7())
            .bind(dto.city_id)
            .bind(&dto.name)
            .bind(&dto.subtitle)
            .bind(&keywords)
            .bind(dto.status.unwrap_or(true))
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        tracing::info!("District created: {} ({})", district.name, district.id);
        self.rows.emit(LifecyclePhase::Stored, &district);
        Ok(district.into())
    }

    pub async fn update(&self, id: Uuid, dto: UpdateDistrictDto) -> Result<DistrictResponseDto> {
        let before = self.rows.find(id).await?;
        check_update(self.directory.as_ref(), &before, &dto)
            .await?
            .into_result()?;

        let keywords = dto.keywords.as_deref().map(keyword_strings);
        let query = format!(
            "UPDATE {} SET city_id = COALESCE($2, city_id), name = COALESCE($3, name), \
             subtitle = CASE WHEN $4 THEN $5 ELSE subtitle END, \
             keywords = COALESCE($6, keywords), status = COALESCE($7, status), \
             updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.rows.table()
        );
        let after = sqlx::query_as::<_, District>(&query)
            .bind(id)
            .bind(dto.city_id)
            .bind(&dto.name)
            .bind(dto.subtitle.is_some())
            .bind(dto.subtitle.clone().flatten())
            .bind(&keywords)
            .bind(dto.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("District with id {} not found", id)))?;

        self.rows.emit_update(&before, &after);
        Ok(after.into())
    }

    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        self.rows.bulk(dto).await
    }
}

pub async fn check_create<D>(directory: &D, dto: &CreateDistrictDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    if let Some(keywords) = &dto.keywords {
        check_string_list(&mut errors, "keywords", keywords);
    }
    check_exists(
        directory,
        &mut errors,
        "city_id",
        LocationKind::City,
        dto.city_id,
    )
    .await?;

    let ctx = ValidationContext::from_payload(dto);
    UniqueName::new(LocationKind::District)
        .validate(directory, &mut errors, "name", &dto.name, &ctx)
        .await?;
    Ok(errors)
}

pub async fn check_update<D>(
    directory: &D,
    current: &District,
    dto: &UpdateDistrictDto,
) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    if let Some(keywords) = &dto.keywords {
        check_string_list(&mut errors, "keywords", keywords);
    }
    if let Some(city_id) = dto.city_id {
        check_exists(
            directory,
            &mut errors,
            "city_id",
            LocationKind::City,
            city_id,
        )
        .await?;
    }

    if dto.name.is_some() || dto.city_id.is_some() {
        let name = dto.name.as_deref().unwrap_or(&current.name);
        let ctx =
            ValidationContext::from_payload(dto).or_insert("city_id", current.city_id);
        UniqueName::new(LocationKind::District)
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
    use serde_json::json;

    #[tokio::test]
    async fn test_non_string_keyword_fails_on_its_index() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Shiraz", None);

        let dto: CreateDistrictDto = serde_json::from_value(json!({
            "city_id": city,
            "name": "Zand",
            "keywords": [123]
        }))
        .unwrap();
        let errors = check_create(&directory, &dto).await.unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["keywords.0"]);
    }

    #[tokio::test]
    async fn test_string_keywords_pass() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Shiraz", None);

        let dto: CreateDistrictDto = serde_json::from_value(json!({
            "city_id": city,
            "name": "Zand",
            "subtitle": "Old quarter",
            "keywords": ["bazaar", "vakil"]
        }))
        .unwrap();
        assert!(check_create(&directory, &dto).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_district_in_same_city() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Shiraz", None);
        directory.add(LocationKind::District, "Zand", Some(city));

        let dto: CreateDistrictDto =
            serde_json::from_value(json!({"city_id": city, "name": "Zand"})).unwrap();
        let errors = check_create(&directory, &dto).await.unwrap();
        assert_eq!(
            errors.get("name").unwrap(),
            ["The name has already been taken in this city."]
        );
    }

    #[tokio::test]
    async fn test_update_keywords_checked_by_index() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Shiraz", None);
        let current = District {
            id: directory.add(LocationKind::District, "Zand", Some(city)),
            city_id: city,
            name: "Zand".to_string(),
            subtitle: None,
            keywords: vec![],
            status: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };

        let dto: UpdateDistrictDto =
            serde_json::from_value(json!({"keywords": ["ok", {"bad": true}]})).unwrap();
        let errors = check_update(&directory, &current, &dto).await.unwrap();
        assert!(errors.has("keywords.1"));
        assert!(!errors.has("name"));
    }

    #[test]
    fn test_update_subtitle_null_means_clear() {
        let cleared: UpdateDistrictDto = serde_json::from_value(json!({"subtitle": null})).unwrap();
        let untouched: UpdateDistrictDto = serde_json::from_value(json!({"name": "Zand"})).unwrap();

        assert_eq!(cleared.subtitle, Some(None));
        assert_eq!(untouched.subtitle, None);
    }
}
