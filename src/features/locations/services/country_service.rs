use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::TableNames;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::events::{EntityKind, EventBus, LifecyclePhase};
use crate::features::locations::dtos::{
    CountryEditDto, CountryResponseDto, CreateCountryDto, LocationFormDto, UpdateCountryDto,
};
use crate::features::locations::models::{Country, LocationKind};
use crate::features::locations::rules::{LocationDirectory, PgLocationDirectory, UniqueName};
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto};
use crate::shared::lifecycle::SoftDeletes;
use crate::shared::listing::{fetch_page, ListSpec};
use crate::shared::query::{ListQuery, SortSpec};
use crate::shared::validation::{FieldErrors, ValidationContext};

pub struct CountryService {
    pool: PgPool,
    directory: Arc<PgLocationDirectory>,
    rows: SoftDeletes<Country>,
}

impl CountryService {
    pub const SORTABLE: &'static [&'static str] =
        &["name", "mobile_prefix", "status", "created_at", "updated_at"];
    pub const FILTERS: &'static [&'static str] = &["name", "status", "trashed"];

    pub fn new(
        pool: PgPool,
        tables: Arc<TableNames>,
        directory: Arc<PgLocationDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        let rows = SoftDeletes::new(pool.clone(), &tables.countries, EntityKind::Country, events);
        Self {
            pool,
            directory,
            rows,
        }
    }

    fn list_spec(&self) -> ListSpec<'_> {
        ListSpec {
            table: self.rows.table(),
            sortable: Self::SORTABLE,
            filters: Self::FILTERS,
            default_sort: SortSpec::asc("name"),
            search: Some("name"),
            parent: None,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<CountryResponseDto>, i64)> {
        let (rows, total) = fetch_page::<Country>(&self.pool, &self.list_spec(), query).await?;
        Ok((rows.into_iter().map(CountryResponseDto::from).collect(), total))
    }

    /// Countries have no parent to choose
    pub fn form(&self) -> LocationFormDto {
        LocationFormDto::default()
    }

    pub async fn edit(&self, id: Uuid) -> Result<CountryEditDto> {
        let country = self.rows.find(id).await?;
        Ok(CountryEditDto {
            record: country.into(),
            form: self.form(),
        })
    }

    pub async fn create(&self, dto: CreateCountryDto) -> Result<CountryResponseDto> {
        check_create(self.directory.as_ref(), &dto).await?.into_result()?;

        let query = format!(
            "INSERT INTO {} (id, name, flag, mobile_prefix, validation, address_on_letter, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
            self.rows.table()
        );
        let country = sqlx::query_as::<_, Country>(&query)
            .bind(Uuid::now_v7())
            .bind(&dto.name)
            .bind(&dto.flag)
            .bind(&dto.mobile_prefix)
            .bind(&dto.validation)
            .bind(&dto.address_on_letter)
            .bind(dto.status.unwrap_or(true))
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        tracing::info!("Country created: {} ({})", country.name, country.id);
        self.rows.emit(LifecyclePhase::Stored, &country);
        Ok(country.into())
    }

    pub async fn update(&self, id: Uuid, dto: UpdateCountryDto) -> Result<CountryResponseDto> {
        let before = self.rows.find(id).await?;
        check_update(self.directory.as_ref(), &before, &dto)
            .await?
            .into_result()?;

        let query = format!(
            "UPDATE {} SET name = COALESCE($2, name), \
             flag = CASE WHEN $3 THEN $4 ELSE flag END, \
             mobile_prefix = CASE WHEN $5 THEN $6 ELSE mobile_prefix END, \
             validation = CASE WHEN $7 THEN $8 ELSE validation END, \
             address_on_letter = CASE WHEN $9 THEN $10 ELSE address_on_letter END, \
             status = COALESCE($11, status), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.rows.table()
        );
        let after = sqlx::query_as::<_, Country>(&query)
            .bind(id)
            .bind(&dto.name)
            .bind(dto.flag.is_some())
            .bind(dto.flag.clone().flatten())
            .bind(dto.mobile_prefix.is_some())
            .bind(dto.mobile_prefix.clone().flatten())
            .bind(dto.validation.is_some())
            .bind(dto.validation.clone().flatten())
            .bind(dto.address_on_letter.is_some())
            .bind(dto.address_on_letter.clone().flatten())
            .bind(dto.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Country with id {} not found", id)))?;

        self.rows.emit_update(&before, &after);
        Ok(after.into())
    }

    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        self.rows.bulk(dto).await
    }
}

/// Every problem with a new country, collected
pub async fn check_create<D>(directory: &D, dto: &CreateCountryDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    check_validation_patterns(&mut errors, dto.validation.as_ref());

    let ctx = ValidationContext::from_payload(dto);
    UniqueName::new(LocationKind::Country)
        .validate(directory, &mut errors, "name", &dto.name, &ctx)
        .await?;
    Ok(errors)
}

pub async fn check_update<D>(
    directory: &D,
    current: &Country,
    dto: &UpdateCountryDto,
) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    check_validation_patterns(&mut errors, dto.validation.as_ref().and_then(Option::as_ref));

    if let Some(name) = &dto.name {
        let ctx = ValidationContext::from_payload(dto);
        UniqueName::new(LocationKind::Country)
            .ignore(current.id)
            .validate(directory, &mut errors, "name", name, &ctx)
            .await?;
    }
    Ok(errors)
}

/// The `validation` blob maps address field names to regex patterns
fn check_validation_patterns(errors: &mut FieldErrors, validation: Option<&Value>) {
    let Some(validation) = validation else {
        return;
    };
    let Some(patterns) = validation.as_object() else {
        errors.add("validation", "The validation field must be an object.");
        return;
    };

    for (field, pattern) in patterns {
        let key = format!("validation.{}", field);
        match pattern.as_str() {
            Some(pattern) if regex::Regex::new(pattern).is_ok() => {}
            Some(_) => errors.add(
                key,
                format!("The pattern for {} is not a valid regular expression.", field),
            ),
            None => errors.add(key, format!("The pattern for {} must be a string.", field)),
        }
    }
}
