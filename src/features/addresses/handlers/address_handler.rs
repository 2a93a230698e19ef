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
    AddressEditDto, AddressResponseDto, CreateAddressDto, UpdateAddressDto,
};
use crate::features::addresses::models::Owner;
use crate::features::addresses::services::AddressService;
use crate::features::events::EntityKind;
use crate::features::locations::dtos::LocationFormDto;
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto, CapabilitiesDto};
use crate::shared::query::ListQuery;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

/// List addresses with their owners
#[utoipa::path(
    get,
    path = "/api/admin/location/addresses",
    params(ListQuery),
    responses(
        (status = 200, description = "Address page", body = ApiResponse<Vec<AddressResponseDto>>),
        (status = 400, description = "Unknown sort column or malformed filter")
    ),
    tag = "addresses"
)]
pub async fn list_addresses(
    State(service): State<Arc<AddressService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AddressResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, query.page, query.limit())),
    )))
}

/// Live addresses attached to one owner
#[utoipa::path(
    get,
    path = "/api/admin/location/addresses/owners/{owner_type}/{owner_id}",
    params(
        ("owner_type" = String, Path, description = "Owner model name"),
        ("owner_id" = String, Path, description = "Owner record id")
    ),
    responses(
        (status = 200, description = "Addresses of the owner", body = ApiResponse<Vec<AddressResponseDto>>)
    ),
    tag = "addresses"
)]
pub async fn list_addresses_by_owner(
    State(service): State<Arc<AddressService>>,
    Path((owner_type, owner_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<AddressResponseDto>>>> {
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
    path = "/api/admin/location/addresses/create",
    responses(
        (status = 200, description = "Form options", body = ApiResponse<LocationFormDto>)
    ),
    tag = "addresses"
)]
pub async fn create_address_form(
    State(service): State<Arc<AddressService>>,
) -> Result<Json<ApiResponse<LocationFormDto>>> {
    let form = service.form().await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Store an address and attach it to its owner
#[utoipa::path(
    post,
    path = "/api/admin/location/addresses",
    request_body = CreateAddressDto,
    responses(
        (status = 201, description = "Address stored", body = ApiResponse<AddressResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "addresses"
)]
pub async fn store_address(
    State(service): State<Arc<AddressService>>,
    AppJson(dto): AppJson<CreateAddressDto>,
) -> Result<(StatusCode, Json<ApiResponse<AddressResponseDto>>)> {
    let address = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(address, "Address stored successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/location/addresses/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Address and form options", body = ApiResponse<AddressEditDto>),
        (status = 404, description = "Address not found")
    ),
    tag = "addresses"
)]
pub async fn edit_address(
    State(service): State<Arc<AddressService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AddressEditDto>>> {
    let edit = service.edit(id).await?;
    Ok(Json(ApiResponse::success(Some(edit), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/admin/location/addresses/{id}",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    request_body = UpdateAddressDto,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<AddressResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Address not found")
    ),
    tag = "addresses"
)]
pub async fn update_address(
    State(service): State<Arc<AddressService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAddressDto>,
) -> Result<Json<ApiResponse<AddressResponseDto>>> {
    let address = service.update(id, dto).await?;
    Ok(Json(ApiResponse::ok(address, "Address updated successfully")))
}

#[utoipa::path(
    options,
    path = "/api/admin/location/addresses",
    responses(
        (status = 200, description = "Capabilities", body = ApiResponse<CapabilitiesDto>)
    ),
    tag = "addresses"
)]
pub async fn address_capabilities() -> Json<ApiResponse<CapabilitiesDto>> {
    let capabilities = CapabilitiesDto::new(
        EntityKind::Address,
        AddressService::SORTABLE,
        AddressService::FILTERS,
    );
    Json(ApiResponse::success(Some(capabilities), None, None))
}

#[utoipa::path(
    post,
    path = "/api/admin/location/addresses/bulk",
    request_body = BulkActionDto,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkActionResultDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "addresses"
)]
pub async fn bulk_addresses(
    State(service): State<Arc<AddressService>>,
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
