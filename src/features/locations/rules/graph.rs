use std::collections::HashMap;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::locations::models::{LocationKind, LocationRefs};
use crate::shared::validation::FieldErrors;

use super::directory::LocationDirectory;

/// Records an error on `field` when `id` is not a persisted row of `kind`
pub async fn check_exists<D>(
    directory: &D,
    errors: &mut FieldErrors,
    field: &str,
    kind: LocationKind,
    id: Uuid,
) -> Result<()>
where
    D: LocationDirectory + ?Sized,
{
    if !directory.exists(kind, id).await? {
        errors.add(field, format!("The selected {} is invalid.", field));
    }
    Ok(())
}

/// Checks every id set in `refs` independently. Levels are not checked
/// against each other: a city from another province is accepted.
pub async fn check_refs<D>(
    directory: &D,
    errors: &mut FieldErrors,
    prefix: &str,
    refs: &LocationRefs,
) -> Result<()>
where
    D: LocationDirectory + ?Sized,
{
    for (kind, id) in refs.entries() {
        if let Some(id) = id {
            let field = format!("{}{}", prefix, kind.foreign_key());
            check_exists(directory, errors, &field, kind, id).await?;
        }
    }
    Ok(())
}

/// Shape rules of a geo-area relation set: non-empty, no blank tuple, no
/// tuple listed twice
pub fn check_relation_set(errors: &mut FieldErrors, field: &str, relations: &[LocationRefs]) {
    if relations.is_empty() {
        errors.add(field, format!("The {} field is required.", field));
        return;
    }

    let mut first_seen: HashMap<&LocationRefs, usize> = HashMap::new();
    let mut duplicates: Vec<usize> = Vec::new();

    for (index, refs) in relations.iter().enumerate() {
        if refs.is_empty() {
            errors.add(
                format!("{}.{}", field, index),
                "At least one of country_id, province_id, city_id or district_id is required.",
            );
            continue;
        }
        if first_seen.contains_key(refs) {
            duplicates.push(index);
        } else {
            first_seen.insert(refs, index);
        }
    }

    if !duplicates.is_empty() {
        let positions: Vec<String> = duplicates.iter().map(usize::to_string).collect();
        errors.add(
            field,
            format!(
                "The {} field has a duplicate value at position {}.",
                field,
                positions.join(", ")
            ),
        );
    }
}

/// Full consistency check of a relation set, including existence of every
/// referenced id
pub async fn check_relations<D>(
    directory: &D,
    errors: &mut FieldErrors,
    field: &str,
    relations: &[LocationRefs],
) -> Result<()>
where
    D: LocationDirectory + ?Sized,
{
    check_relation_set(errors, field, relations);
    for (index, refs) in relations.iter().enumerate() {
        check_refs(directory, errors, &format!("{}.{}.", field, index), refs).await?;
    }
    Ok(())
}

/// Placement of an address or location: `country_id` is required on
/// create, lower levels only need to exist
pub async fn check_placement<D>(
    directory: &D,
    errors: &mut FieldErrors,
    refs: &LocationRefs,
    country_required: bool,
) -> Result<()>
where
    D: LocationDirectory + ?Sized,
{
    if country_required && refs.country_id.is_none() {
        errors.add("country_id", "The country_id field is required.");
    }
    check_refs(directory, errors, "", refs).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryDirectory;

    fn city_refs(id: Uuid) -> LocationRefs {
        LocationRefs {
            city_id: Some(id),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_tuples_fail_on_locations() {
        let id = Uuid::now_v7();
        let mut errors = FieldErrors::default();
        check_relation_set(&mut errors, "locations", &[city_refs(id), city_refs(id)]);

        let messages = errors.get("locations").unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("position 1"));
    }

    #[test]
    fn test_distinct_tuples_pass() {
        let country = Uuid::now_v7();
        let mut errors = FieldErrors::default();
        let with_country = LocationRefs {
            country_id: Some(country),
            ..Default::default()
        };
        let with_country_and_city = LocationRefs {
            country_id: Some(country),
            city_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        check_relation_set(&mut errors, "locations", &[with_country, with_country_and_city]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_empty_set_and_blank_tuple() {
        let mut errors = FieldErrors::default();
        check_relation_set(&mut errors, "locations", &[]);
        assert!(errors.has("locations"));

        let mut errors = FieldErrors::default();
        check_relation_set(
            &mut errors,
            "locations",
            &[city_refs(Uuid::now_v7()), LocationRefs::default()],
        );
        assert!(errors.has("locations.1"));
        assert!(!errors.has("locations"));
    }

    #[tokio::test]
    async fn test_parent_must_exist_even_when_trashed() {
        let directory = InMemoryDirectory::new();
        let trashed = directory.add_trashed(LocationKind::Country, "Gone", None);

        let mut errors = FieldErrors::default();
        check_exists(&directory, &mut errors, "country_id", LocationKind::Country, trashed)
            .await
            .unwrap();
        assert!(errors.is_empty());

        check_exists(&directory, &mut errors, "country_id", LocationKind::Country, Uuid::now_v7())
            .await
            .unwrap();
        assert_eq!(
            errors.get("country_id").unwrap(),
            ["The selected country_id is invalid."]
        );
    }

    #[tokio::test]
    async fn test_parent_of_wrong_kind_is_rejected() {
        let directory = InMemoryDirectory::new();
        let province = directory.add(LocationKind::Province, "Fars", Some(Uuid::now_v7()));

        let mut errors = FieldErrors::default();
        check_exists(&directory, &mut errors, "city_id", LocationKind::City, province)
            .await
            .unwrap();
        assert!(errors.has("city_id"));
    }

    #[tokio::test]
    async fn test_relation_refs_report_indexed_fields() {
        let directory = InMemoryDirectory::new();
        let known = directory.add(LocationKind::City, "Rasht", Some(Uuid::now_v7()));

        let mut errors = FieldErrors::default();
        let relations = [city_refs(known), city_refs(Uuid::now_v7())];
        check_relations(&directory, &mut errors, "locations", &relations)
            .await
            .unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["locations.1.city_id"]);
    }

    #[tokio::test]
    async fn test_levels_are_not_cross_checked() {
        let directory = InMemoryDirectory::new();
        let province = directory.add(LocationKind::Province, "Gilan", Some(Uuid::now_v7()));
        let city_elsewhere = directory.add(LocationKind::City, "Shiraz", Some(Uuid::now_v7()));

        let refs = LocationRefs {
            province_id: Some(province),
            city_id: Some(city_elsewhere),
            ..Default::default()
        };
        let mut errors = FieldErrors::default();
        check_refs(&directory, &mut errors, "", &refs).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_placement_requires_country() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Rasht", None);

        let mut errors = FieldErrors::default();
        check_placement(&directory, &mut errors, &city_refs(city), true)
            .await
            .unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["country_id"]);

        let mut errors = FieldErrors::default();
        check_placement(&directory, &mut errors, &city_refs(city), false)
            .await
            .unwrap();
        assert!(errors.is_empty());
    }
}
