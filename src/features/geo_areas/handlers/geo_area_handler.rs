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
use crate::features::geo_areas::dtos::{
    CreateGeoAreaDto, GeoAreaEditDto, GeoAreaResponseDto, UpdateGeoAreaDto,
};
use crate::features::geo_areas::services::GeoAreaService;
use crate::features::locations::dtos::LocationFormDto;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List geo-areas with their member locations
#[utoipa::path(
    get,
    path = "/api/admin/location/geo-areas",
    params(ListQuery),
    responses(
        (status = 200, description = "Geo-area page", body = ApiResponse<Vec<GeoAreaResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "geo-areas"
)]
pub async fn list_geo_areas(
    State(service): State<Arc<GeoAreaService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<GeoAreaResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/location/geo-areas/create",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "geo-areas"
)]
pub async fn create_geo_area_form(
    State(service): State<Arc<GeoAreaService>>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    let form = service.form().await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Store a geo-area and its member locations in one transaction
#[utoipa::path(
    post,
    path = "/api/admin/location/geo-areas",
    request_body = CreateGeoAreaDto,
    responses(
        (status = 201, description = "Geo-area stored", body = ApiResponse<GeoAreaResponseDto>),
        (status = 400, description = "Validation error, including duplicate locations")
    ),
    tag = "geo-areas"
)]
pub async fn store_geo_area(
    State(service): State<Arc<GeoAreaService>>,
    AppJson(dto): AppJson<CreateGeoAreaDto>,
) -> Result<(StatusCode, Json<ApiResponse<GeoAreaResponseDto>>)> {
    let area = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(area, "Geo area stored successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/location/geo-areas/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Geo-area ID")
    ),
    responses(
        (status = 200, description = "Geo-area and form options", body = ApiResponse<GeoAreaEditDto>),
        (status = 404, description = "Geo-area not found")
    ),
    tag = "geo-areas"
)]
pub async fn edit_geo_area(
    State(service): State<Arc<GeoAreaService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GeoAreaEditDto>>> {
    let edit = service.edit(id).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

/// Update a geo-area; a present `locations` list replaces the member set
#[utoipa::path(
    put,
    path = "/api/admin/location/geo-areas/{id}",
    params(
        ("id" = Uuid, Path, description = "Geo-area ID")
    ),
    request_body = UpdateGeoAreaDto,
    responses(
        (status = 200, description = "Geo-area updated", body = ApiResponse<GeoAreaResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Geo-area not found")
    ),
    tag = "geo-areas"
)]
pub async fn update_geo_area(
    State(service): State<Arc<GeoAreaService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateGeoAreaDto>,
) -> Result<Json<ApiResponse<GeoAreaResponseDto>>> {
    let area = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(area, "Geo area updated successfully")))
}

#[utoipa::path(
    options,
    path = "/api/admin/location/geo-areas",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "geo-areas"
)]
pub async fn geo_area_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::GeoArea,
        GeoAreaService::SORTABLE,
        GeoAreaService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

#[utoipa::path(
    post,
    path = "/api/admin/location/geo-areas/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "geo-areas"
)]
pub async fn bulk_geo_areas(
    State(service): State<Arc<GeoAreaService>>,
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
