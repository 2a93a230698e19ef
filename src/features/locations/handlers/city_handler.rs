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
    CityEditDto, CityResponseDto, CreateCityDto, FormQuery, LocationFormDto, UpdateCityDto,
};
use crate::features::locations::services::CityService;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List cities with paging, sorting and filters
#[utoipa::path(
    get,
    path = "/api/admin/location/cities",
    params(ListQuery),
    responses(
        (status = 200, description = "City page", body = ApiResponse<Vec<CityResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "locations"
)]
pub async fn list_cities(
    State(service): State<Arc<CityService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<CityResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

/// Options needed to render the city create form
#[utoipa::path(
    get,
    path = "/api/admin/location/cities/create",
    params(FormQuery),
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "locations"
)]
pub async fn create_city_form(
    State(service): State<Arc<CityService>>,
    AppQuery(query): AppQuery<FormQuery>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    let form = service.form(&query).await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Store a new city
#[utoipa::path(
    post,
    path = "/api/admin/location/cities",
    request_body = CreateCityDto,
    responses(
        (status = 201, description = "City stored", body = ApiResponse<CityResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn store_city(
    State(service): State<Arc<CityService>>,
    AppJson(dto): AppJson<CreateCityDto>,
) -> Result<(StatusCode, Json<ApiResponse<CityResponseDto>>)> {
    let city = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(city, "City stored successfully")),
    ))
}

/// A city together with its edit form options
#[utoipa::path(
    get,
    path = "/api/admin/location/cities/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "City ID"),
        FormQuery
    ),
    responses(
        (status = 200, description = "City and form options", body = ApiResponse<CityEditDto>),
        (status = 404, description = "City not found")
    ),
    tag = "locations"
)]
pub async fn edit_city(
    State(service): State<Arc<CityService>>,
    Path(id): Path<Uuid>,
    AppQuery(query): AppQuery<FormQuery>,
) -> Result<Json<ApiResponse<CityEditDto>>> {
    let edit = service.edit(id, &query).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

/// Update a city; absent fields keep their value
#[utoipa::path(
    put,
    path = "/api/admin/location/cities/{id}",
    params(
        ("id" = Uuid, Path, description = "City ID")
    ),
    request_body = UpdateCityDto,
    responses(
        (status = 200, description = "City updated", body = ApiResponse<CityResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "City not found")
    ),
    tag = "locations"
)]
pub async fn update_city(
    State(service): State<Arc<CityService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCityDto>,
) -> Result<Json<ApiResponse<CityResponseDto>>> {
    let city = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(city, "City updated successfully")))
}

/// Bulk actions, sort columns and filters the city list supports
#[utoipa::path(
    options,
    path = "/api/admin/location/cities",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "locations"
)]
pub async fn city_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::City,
        CityService::SORTABLE,
        CityService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

/// Delete, restore, force delete, activate or deactivate many cities
#[utoipa::path(
    post,
    path = "/api/admin/location/cities/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn bulk_cities(
    State(service): State<Arc<CityService>>,
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
