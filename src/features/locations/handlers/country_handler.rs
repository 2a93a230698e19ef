use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::events::EntityKind;
use crate::features::locations::dtos::{
    CountryEditDto, CountryResponseDto, CreateCountryDto, LocationFormDto, UpdateCountryDto,
};
use crate::features::locations::services::CountryService;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List countries with paging, sorting and filters
#[utoipa::path(
    get,
    path = "/api/admin/location/countries",
    params(ListQuery),
    responses(
        (status = 200, description = "Country page", body = ApiResponse<Vec<CountryResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "locations"
)]
pub async fn list_countries(
    State(service): State<Arc<CountryService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<CountryResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

/// Options needed to render the country create form
#[utoipa::path(
    get,
    path = "/api/admin/location/countries/create",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "locations"
)]
pub async fn create_country_form(
    State(service): State<Arc<CountryService>>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    Ok(Json(ApiResponse::success(Some(service.form()), None, None)))
}

/// Store a new country
#[utoipa::path(
    post,
    path = "/api/admin/location/countries",
    request_body = CreateCountryDto,
    responses(
        (status = 201, description = "Country stored", body = ApiResponse<CountryResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn store_country(
    State(service): State<Arc<CountryService>>,
    AppJson(dto): AppJson<CreateCountryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CountryResponseDto>>)> {
    let country = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(country, "Country stored successfully")),
    ))
}

/// A country together with its edit form options
#[utoipa::path(
    get,
    path = "/api/admin/location/countries/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Country ID")
    ),
    responses(
        (status = 200, description = "Country and form options", body = ApiResponse<CountryEditDto>),
        (status = 404, description = "Country not found")
    ),
    tag = "locations"
)]
pub async fn edit_country(
    State(service): State<Arc<CountryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CountryEditDto>>> {
    let edit = service.edit(id).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

/// Update a country; absent fields keep their value
#[utoipa::path(
    put,
    path = "/api/admin/location/countries/{id}",
    params(
        ("id" = Uuid, Path, description = "Country ID")
    ),
    request_body = UpdateCountryDto,
    responses(
        (status = 200, description = "Country updated", body = ApiResponse<CountryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Country not found")
    ),
    tag = "locations"
)]
pub async fn update_country(
    State(service): State<Arc<CountryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCountryDto>,
) -> Result<Json<ApiResponse<CountryResponseDto>>> {
    let country = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(country, "Country updated successfully")))
}

/// Bulk actions, sort columns and filters the country list supports
#[utoipa::path(
    options,
    path = "/api/admin/location/countries",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "locations"
)]
pub async fn country_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::Country,
        CountryService::SORTABLE,
        CountryService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

/// Delete, restore, force delete, activate or deactivate many countries
#[utoipa::path(
    post,
    path = "/api/admin/location/countries/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn bulk_countries(
    State(service): State<Arc<CountryService>>,
    AppJson(dto): AppJson<BulkActionDto>,
) -> Result<Json<ApiResponse<BulkActionResultDto>>> {
    dto.validate().map_err(FieldErrors::from).map_err(AppError::FieldValidation)?;

    let result = service.bulk(&dto).await?;
    let message = format!(
        "{} succeeded, {} failed",
        result.succeeded.len(),
        result.failed.len()
    );
    Ok(Json(ApiResponse::ok(result, message)))
}
