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
    CreateProvinceDto, LocationFormDto, ProvinceEditDto, ProvinceResponseDto, UpdateProvinceDto,
};
use crate::features::locations::services::ProvinceService;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List provinces with paging, sorting and filters
#[utoipa::path(
    get,
    path = "/api/admin/location/provinces",
    params(ListQuery),
    responses(
        (status = 200, description = "Province page", body = ApiResponse<Vec<ProvinceResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "locations"
)]
pub async fn list_provinces(
    State(service): State<Arc<ProvinceService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ProvinceResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

/// Options needed to render the province create form
#[utoipa::path(
    get,
    path = "/api/admin/location/provinces/create",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "locations"
)]
pub async fn create_province_form(
    State(service): State<Arc<ProvinceService>>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    let form = service.form().await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Store a new province
#[utoipa::path(
    post,
    path = "/api/admin/location/provinces",
    request_body = CreateProvinceDto,
    responses(
        (status = 201, description = "Province stored", body = ApiResponse<ProvinceResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn store_province(
    State(service): State<Arc<ProvinceService>>,
    AppJson(dto): AppJson<CreateProvinceDto>,
) -> Result<(StatusCode, Json<ApiResponse<ProvinceResponseDto>>)> {
    let province = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(province, "Province stored successfully")),
    ))
}

/// A province together with its edit form options
#[utoipa::path(
    get,
    path = "/api/admin/location/provinces/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Province ID")
    ),
    responses(
        (status = 200, description = "Province and form options", body = ApiResponse<ProvinceEditDto>),
        (status = 404, description = "Province not found")
    ),
    tag = "locations"
)]
pub async fn edit_province(
    State(service): State<Arc<ProvinceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProvinceEditDto>>> {
    let edit = service.edit(id).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

/// Update a province; absent fields keep their value
#[utoipa::path(
    put,
    path = "/api/admin/location/provinces/{id}",
    params(
        ("id" = Uuid, Path, description = "Province ID")
    ),
    request_body = UpdateProvinceDto,
    responses(
        (status = 200, description = "Province updated", body = ApiResponse<ProvinceResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Province not found")
    ),
    tag = "locations"
)]
pub async fn update_province(
    State(service): State<Arc<ProvinceService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateProvinceDto>,
) -> Result<Json<ApiResponse<ProvinceResponseDto>>> {
    let province = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(province, "Province updated successfully")))
}

/// Bulk actions, sort columns and filters the province list supports
#[utoipa::path(
    options,
    path = "/api/admin/location/provinces",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "locations"
)]
pub async fn province_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::Province,
        ProvinceService::SORTABLE,
        ProvinceService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

/// Delete, restore, force delete, activate or deactivate many provinces
#[utoipa::path(
    post,
    path = "/api/admin/location/provinces/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "locations"
)]
pub async fn bulk_provinces(
    State(service): State<Arc<ProvinceService>>,
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
