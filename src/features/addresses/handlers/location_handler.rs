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
use crate::features::addresses::dtos::{
    CreateLocationDto, LocationEditDto, LocationResponseDto, UpdateLocationDto,
};
use crate::features::addresses::models::Owner;
use crate::features::addresses::services::LocationService;
use crate::features::events::EntityKind;
use crate::features::locations::dtos::LocationFormDto;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List locations with their owners
#[utoipa::path(
    get,
    path = "/api/admin/location/locations",
    params(ListQuery),
    responses(
        (status = 200, description = "Location page", body = ApiResponse<Vec<LocationResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "addresses"
)]
pub async fn list_locations(
    State(service): State<Arc<LocationService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<LocationResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

/// Live locations attached to one owner
#[utoipa::path(
    get,
    path = "/api/admin/location/locations/owners/{owner_type}/{owner_id}",
    params(
        ("owner_type" = String, Path, description = "Owner model name"),
        ("owner_id" = String, Path, description = "Owner record id")
    ),
    responses(
        (status = 200, description = "Locations of the owner", body = ApiResponse<Vec<LocationResponseDto>>)
    ),
    tag = "addresses"
)]
pub async fn list_locations_by_owner(
    State(service): State<Arc<LocationService>>,
    Path((owner_type, owner_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<LocationResponseDto>>>> {
    let owner = Owner {
        owner_type,
        owner_id,
    };
    let items = service.list_by_owner(&owner).await?;
    let total = items.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta {
            total,
            page: None,
            page_size: None,
        }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/location/locations/create",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "addresses"
)]
pub async fn create_location_form(
    State(service): State<Arc<LocationService>>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    let form = service.form().await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Store a location and attach it to its owner
#[utoipa::path(
    post,
    path = "/api/admin/location/locations",
    request_body = CreateLocationDto,
    responses(
        (status = 201, description = "Location stored", body = ApiResponse<LocationResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "addresses"
)]
pub async fn store_location(
    State(service): State<Arc<LocationService>>,
    AppJson(dto): AppJson<CreateLocationDto>,
) -> Result<(StatusCode, Json<ApiResponse<LocationResponseDto>>)> {
    let location = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(location, "Location stored successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/location/locations/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location and form options", body = ApiResponse<LocationEditDto>),
        (status = 404, description = "Location not found")
    ),
    tag = "addresses"
)]
pub async fn edit_location(
    State(service): State<Arc<LocationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LocationEditDto>>> {
    let edit = service.edit(id).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/admin/location/locations/{id}",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    request_body = UpdateLocationDto,
    responses(
        (status = 200, description = "Location updated", body = ApiResponse<LocationResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Location not found")
    ),
    tag = "addresses"
)]
pub async fn update_location(
    State(service): State<Arc<LocationService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateLocationDto>,
) -> Result<Json<ApiResponse<LocationResponseDto>>> {
    let location = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(location, "Location updated successfully")))
}

#[utoipa::path(
    options,
    path = "/api/admin/location/locations",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "addresses"
)]
pub async fn location_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::Location,
        LocationService::SORTABLE,
        LocationService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

#[utoipa::path(
    post,
    path = "/api/admin/location/locations/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "addresses"
)]
pub async fn bulk_locations(
    State(service): State<Arc<LocationService>>,
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
