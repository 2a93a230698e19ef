use std::sync::Arc;

use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::TableNames;
use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::addresses::dtos::{
    AddressEditDto, AddressResponseDto, CreateAddressDto, UpdateAddressDto,
};
use crate::features::addresses::models::{Address, Owner};
use crate::features::addresses::services::owners::OwnerTable;
use crate::features::events::{EntityKind, EventBus, LifecyclePhase};
use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::LocationKind;
use crate::features::locations::rules::graph::check_placement;
use crate::features::locations::rules::{LocationDirectory, PgLocationDirectory};
use crate::shared::bulk::{BulkActionDto, BulkActionResultDto};
use crate::shared::constants::{ADDRESS_INFO_KEYS, ADDRESS_LINE_KEYS};
use crate::shared::lifecycle::SoftDeletes;
use crate::shared::listing::{fetch_page, ListSpec};
use crate::shared::query::{ListQuery, SortSpec};
use crate::shared::validation::{check_object_keys, FieldErrors, MOBILE_PREFIX_REGEX};

pub struct AddressService {
    pool: PgPool,
    owners: OwnerTable,
    directory: Arc<PgLocationDirectory>,
    rows: SoftDeletes<Address>,
}

impl AddressService {
    pub const SORTABLE: &'static [&'static str] =
        &["postcode", "status", "created_at", "updated_at"];
    pub const FILTERS: &'static [&'static str] = &[
        "name",
        "status",
        "trashed",
        "country_id",
        "province_id",
        "city_id",
    ];

    pub fn new(
        pool: PgPool,
        tables: Arc<TableNames>,
        directory: Arc<PgLocationDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        let rows = SoftDeletes::new(pool.clone(), &tables.addresses, EntityKind::Address, events);
        Self {
            pool,
            owners: OwnerTable::new(&tables.address_relations, "address_id"),
            directory,
            rows,
        }
    }

    /// `filter[name]` searches the address lines; the narrowest given level
    /// filter wins
    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<AddressResponseDto>, i64)> {
        let parent = query
            .filter_city_id
            .map(|id| ("city_id", id))
            .or(query.filter_province_id.map(|id| ("province_id", id)))
            .or(query.filter_country_id.map(|id| ("country_id", id)));
        let spec = ListSpec {
            table: self.rows.table(),
            sortable: Self::SORTABLE,
            filters: Self::FILTERS,
            default_sort: SortSpec::desc("created_at"),
            search: Some("address::text"),
            parent,
        };
        let (rows, total) = fetch_page::<Address>(&self.pool, &spec, query).await?;
        Ok((self.with_owners(rows).await?, total))
    }

    pub async fn list_by_owner(&self, owner: &Owner) -> Result<Vec<AddressResponseDto>> {
        let rows: Vec<Address> = self
            .owners
            .owned_by(&self.pool, self.rows.table(), owner)
            .await?;
        Ok(rows
            .into_iter()
            .map(|address| AddressResponseDto::new(address, Some(owner.clone())))
            .collect())
    }

    pub async fn form(&self) -> Result<LocationFormDto> {
        let parents = self.directory.options(LocationKind::Country, None).await?;
        Ok(LocationFormDto {
            parent_field: Some("country_id".to_string()),
            parents,
        })
    }

    pub async fn edit(&self, id: Uuid) -> Result<AddressEditDto> {
        let address = self.rows.find(id).await?;
        let owner = self.owners.owner_of(&self.pool, id).await?;
        Ok(AddressEditDto {
            record: AddressResponseDto::new(address, owner),
            form: self.form().await?,
        })
    }

    pub async fn create(&self, dto: CreateAddressDto) -> Result<AddressResponseDto> {
        check_create(self.directory.as_ref(), &dto).await?.into_result()?;
        let Some(country_id) = dto.country_id else {
            return Err(AppError::FieldValidation(FieldErrors::single(
                "country_id",
                "The country_id field is required.",
            )));
        };

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let query = format!(
            "INSERT INTO {} (id, country_id, province_id, city_id, district_id, address, \
             postcode, lat, lng, info, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
            self.rows.table()
        );
        let address = sqlx::query_as::<_, Address>(&query)
            .bind(Uuid::now_v7())
            .bind(country_id)
            .bind(dto.province_id)
            .bind(dto.city_id)
            .bind(dto.district_id)
            .bind(Value::Object(dto.address.clone().unwrap_or_default()))
            .bind(&dto.postcode)
            .bind(dto.lat)
            .bind(dto.lng)
            .bind(Value::Object(dto.info.clone().unwrap_or_default()))
            .bind(dto.status.unwrap_or(true))
            .fetch_one(&mut *tx)
            .await
            .map_err(handle_db_error)?;

        let owner = dto.owner();
        self.owners.attach(&mut tx, address.id, &owner).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Address {} created for {} {}",
            address.id,
            owner.owner_type,
            owner.owner_id
        );
        self.rows.emit(LifecyclePhase::Stored, &address);
        Ok(AddressResponseDto::new(address, Some(owner)))
    }

    pub async fn update(&self, id: Uuid, dto: UpdateAddressDto) -> Result<AddressResponseDto> {
        let before = self.rows.find(id).await?;
        check_update(self.directory.as_ref(), &dto).await?.into_result()?;

        let query = format!(
            "UPDATE {} SET country_id = COALESCE($2, country_id), \
             province_id = CASE WHEN $3 THEN $4 ELSE province_id END, \
             city_id = CASE WHEN $5 THEN $6 ELSE city_id END, \
             district_id = CASE WHEN $7 THEN $8 ELSE district_id END, \
             address = COALESCE($9, address), \
             postcode = CASE WHEN $10 THEN $11 ELSE postcode END, \
             lat = CASE WHEN $12 THEN $13 ELSE lat END, \
             lng = CASE WHEN $14 THEN $15 ELSE lng END, \
             info = COALESCE($16, info), status = COALESCE($17, status), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.rows.table()
        );
        let after = sqlx::query_as::<_, Address>(&query)
            .bind(id)
            .bind(dto.country_id)
            .bind(dto.province_id.is_some())
            .bind(dto.province_id.flatten())
            .bind(dto.city_id.is_some())
            .bind(dto.city_id.flatten())
            .bind(dto.district_id.is_some())
            .bind(dto.district_id.flatten())
            .bind(dto.address.clone().map(Value::Object))
            .bind(dto.postcode.is_some())
            .bind(dto.postcode.clone().flatten())
            .bind(dto.lat.is_some())
            .bind(dto.lat.flatten())
            .bind(dto.lng.is_some())
            .bind(dto.lng.flatten())
            .bind(dto.info.clone().map(Value::Object))
            .bind(dto.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Address with id {} not found", id)))?;

        self.rows.emit_update(&before, &after);
        let owner = self.owners.owner_of(&self.pool, id).await?;
        Ok(AddressResponseDto::new(after, owner))
    }

    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        self.rows.bulk(dto).await
    }

    async fn with_owners(&self, rows: Vec<Address>) -> Result<Vec<AddressResponseDto>> {
        let ids: Vec<Uuid> = rows.iter().map(|a| a.id).collect();
        let mut owners = self.owners.owners_of(&self.pool, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|address| {
                let owner = owners.remove(&address.id);
                AddressResponseDto::new(address, owner)
            })
            .collect())
    }
}

pub async fn check_create<D>(directory: &D, dto: &CreateAddressDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    check_payloads(&mut errors, dto.address.as_ref(), dto.info.as_ref());
    check_placement(directory, &mut errors, &dto.refs(), true).await?;
    Ok(errors)
}

pub async fn check_update<D>(directory: &D, dto: &UpdateAddressDto) -> Result<FieldErrors>
where
    D: LocationDirectory + ?Sized,
{
    let mut errors = dto.validate().err().map(FieldErrors::from).unwrap_or_default();
    check_payloads(&mut errors, dto.address.as_ref(), dto.info.as_ref());
    check_placement(directory, &mut errors, &dto.refs(), false).await?;
    Ok(errors)
}

/// Allow-listed keys in `address` and `info`, plus the info dialling prefix
fn check_payloads(
    errors: &mut FieldErrors,
    address: Option<&Map<String, Value>>,
    info: Option<&Map<String, Value>>,
) {
    if let Some(address) = address {
        check_object_keys(errors, "address", address, ADDRESS_LINE_KEYS);
    }
    if let Some(info) = info {
        check_object_keys(errors, "info", info, ADDRESS_INFO_KEYS);
        if let Some(prefix) = info.get("mobile_prefix").and_then(Value::as_str) {
            if !MOBILE_PREFIX_REGEX.is_match(prefix) {
                errors.add("info.mobile_prefix", "The mobile prefix must be 1 to 4 digits.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryDirectory;
    use fake::faker::address::en::{BuildingNumber, PostCode, StreetName};
    use fake::Fake;
    use serde_json::json;

    fn payload(country_id: Uuid, extra: Value) -> CreateAddressDto {
        let mut body = json!({
            "owner_type": "user",
            "owner_id": "42",
            "country_id": country_id,
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_address_keys_are_listed() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);

        let dto = payload(country, json!({"address": {"street": "Valiasr", "city": "Tehran"}}));
        let errors = check_create(&directory, &dto).await.unwrap();
        assert!(errors.get("address").unwrap()[0].contains("city"));
    }

    #[tokio::test]
    async fn test_allowed_and_empty_payloads_pass() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);

        let street: String = StreetName().fake();
        let number: String = BuildingNumber().fake();
        let postcode: String = PostCode().fake();
        let dto = payload(
            country,
            json!({
                "address": {"street": street, "number": number},
                "info": {},
                "postcode": postcode,
                "lat": 35.7,
                "lng": 51.4
            }),
        );
        assert!(check_create(&directory, &dto).await.unwrap().is_empty());

        let dto = payload(country, json!({"address": {}}));
        assert!(check_create(&directory, &dto).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_info_keys_fail() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);

        let dto = payload(country, json!({"info": {"mobile": "9121234567", "email": "x@y.z"}}));
        let errors = check_create(&directory, &dto).await.unwrap();
        assert!(errors.get("info").unwrap()[0].contains("email"));
    }

    #[tokio::test]
    async fn test_country_is_required_and_must_exist() {
        let directory = InMemoryDirectory::new();

        let dto: CreateAddressDto =
            serde_json::from_value(json!({"owner_type": "user", "owner_id": "1"})).unwrap();
        let errors = check_create(&directory, &dto).await.unwrap();
        assert!(errors.has("country_id"));

        let dto = payload(Uuid::now_v7(), json!({}));
        let errors = check_create(&directory, &dto).await.unwrap();
        assert_eq!(
            errors.get("country_id").unwrap(),
            ["The selected country_id is invalid."]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_coordinates_and_bad_prefix() {
        let directory = InMemoryDirectory::new();
        let country = directory.add(LocationKind::Country, "Iran", None);

        let dto = payload(
            country,
            json!({"lat": 120.0, "info": {"mobile_prefix": "+98"}}),
        );
        let errors = check_create(&directory, &dto).await.unwrap();
        assert!(errors.has("lat"));
        assert!(errors.has("info.mobile_prefix"));
    }

    #[tokio::test]
    async fn test_update_checks_only_given_levels() {
        let directory = InMemoryDirectory::new();
        let dto = UpdateAddressDto {
            postcode: Some(Some("1234567890".to_string())),
            ..Default::default()
        };
        assert!(check_update(&directory, &dto).await.unwrap().is_empty());

        let dto = UpdateAddressDto {
            district_id: Some(Some(Uuid::now_v7())),
            ..Default::default()
        };
        assert!(check_update(&directory, &dto).await.unwrap().has("district_id"));
    }

    #[tokio::test]
    async fn test_update_null_clears_without_existence_checks() {
        let directory = InMemoryDirectory::new();
        let dto: UpdateAddressDto = serde_json::from_value(json!({
            "province_id": null,
            "city_id": null,
            "postcode": null,
            "lat": null,
            "lng": null
        }))
        .unwrap();

        assert_eq!(dto.city_id, Some(None));
        assert_eq!(dto.lat, Some(None));
        assert_eq!(dto.district_id, None);
        assert_eq!(dto.refs().city_id, None);
        assert!(check_update(&directory, &dto).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_coordinates_still_range_checked() {
        let directory = InMemoryDirectory::new();
        let dto: UpdateAddressDto =
            serde_json::from_value(json!({"lat": 91.0, "lng": -200.0})).unwrap();
        let errors = check_update(&directory, &dto).await.unwrap();
        assert!(errors.has("lat"));
        assert!(errors.has("lng"));
    }
}
