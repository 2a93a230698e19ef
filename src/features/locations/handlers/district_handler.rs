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
    CreateDistrictDto, DistrictEditDto, DistrictResponseDto, FormQuery, LocationFormDto,
    UpdateDistrictDto,
};
use crate::features::locations::services::DistrictService;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List districts with paging, sorting and filters
#[utoipa::path(
    get,
    path = "/api/admin/location/districts",
    params(ListQuery),
    responses(
        (status = 200, description = "District page", body = ApiResponse<Vec<DistrictResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "locations"
)]
pub async fn list_districts(
    State(service): State<Arc<DistrictService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<DistrictResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

/// Options needed to render the district create form
#[utoipa::path(
    get,
    path = "/api/admin/location/districts/create",
    params(FormQuery),
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "locations"
)]
pub async fn create_district_form(
    State(service): State<Arc<DistrictService>>,
    AppQuery(query): AppQuery<FormQuery>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    let form = service.form(&query).await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Store a new district
#[utoipa::path(
    post,
    path = "/api/admin/location/districts",
    request_body = CreateDistrictDto,
    responses(
        (status = 201, description = "District stored", body = ApiResponse<DistrictResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn store_district(
    State(service): State<Arc<DistrictService>>,
    AppJson(dto): AppJson<CreateDistrictDto>,
) -> Result<(StatusCode, Json<ApiResponse<DistrictResponseDto>>)> {
    let district = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(district, "District stored successfully")),
    ))
}

/// A district together with its edit form options
#[utoipa::path(
    get,
    path = "/api/admin/location/districts/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "District ID"),
        FormQuery
    ),
    responses(
        (status = 200, description = "District and form options", body = ApiResponse<DistrictEditDto>),
        (status = 404, description = "District not found")
    ),
    tag = "locations"
)]
pub async fn edit_district(
    State(service): State<Arc<DistrictService>>,
    Path(id): Path<Uuid>,
    AppQuery(query): AppQuery<FormQuery>,
) -> Result<Json<ApiResponse<DistrictEditDto>>> {
    let edit = service.edit(id, &query).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

/// Update a district; absent fields keep their value
#[utoipa::path(
    put,
    path = "/api/admin/location/districts/{id}",
    params(
        ("id" = Uuid, Path, description = "District ID")
    ),
    request_body = UpdateDistrictDto,
    responses(
        (status = 200, description = "District updated", body = ApiResponse<DistrictResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "District not found")
    ),
    tag = "locations"
)]
pub async fn update_district(
    State(service): State<Arc<DistrictService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateDistrictDto>,
) -> Result<Json<ApiResponse<DistrictResponseDto>>> {
    let district = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(district, "District updated successfully")))
}

/// Bulk actions, sort columns and filters the district list supports
#[utoipa::path(
    options,
    path = "/api/admin/location/districts",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "locations"
)]
pub async fn district_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::District,
        DistrictService::SORTABLE,
        DistrictService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

/// Delete, restore, force delete, activate or deactivate many districts
#[utoipa::path(
    post,
    path = "/api/admin/location/districts/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn bulk_districts(
    State(service): State<Arc<DistrictService>>,
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
