use uuid::Uuid;

use crate::core::error::Result;
use crate::features::locations::models::LocationKind;
use crate::shared::validation::{FieldErrors, ValidationContext};

use super::directory::{LocationDirectory, NameScope};

/// Name uniqueness among the siblings of one hierarchy level.
///
/// Countries are unique globally; every other level is unique within its
/// parent. The parent id is taken from [`UniqueName::within`] when given,
/// otherwise from the scope column of the record under validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueName {
    kind: LocationKind,
    ignore: Option<Uuid>,
    parent_id: Option<Uuid>,
}

impl UniqueName {
    pub fn new(kind: LocationKind) -> Self {
        Self {
            kind,
            ignore: None,
            parent_id: None,
        }
    }

    /// Resolves the level from a model name such as `city` or
    /// `location_city`. Unknown models are a configuration error.
    pub fn for_model(model: &str) -> Result<Self> {
        Ok(Self::new(model.parse()?))
    }

    /// Skip the record being updated
    pub fn ignore(mut self, id: Uuid) -> Self {
        self.ignore = Some(id);
        self
    }

    /// Pin the parent instead of reading it from the record
    pub fn within(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// The lookup to run, or `None` when a scoped level has no parent to
    /// scope by. The missing parent is reported by its own required rule.
    pub fn scope(&self, name: &str, ctx: &ValidationContext) -> Option<NameScope> {
        let parent_id = match self.kind.scope_column() {
            None => None,
            Some(column) => Some(self.parent_id.or_else(|| ctx.uuid(column))?),
        };

        Some(NameScope {
            kind: self.kind,
            name: name.to_string(),
            parent_id,
            exclude_id: self.ignore,
        })
    }

    pub async fn passes<D>(
        &self,
        directory: &D,
        name: &str,
        ctx: &ValidationContext,
    ) -> Result<bool>
    where
        D: LocationDirectory + ?Sized,
    {
        match self.scope(name, ctx) {
            Some(scope) => Ok(!directory.name_taken(&scope).await?),
            None => Ok(true),
        }
    }

    /// Runs the rule and records a failure on `field`
    pub async fn validate<D>(
        &self,
        directory: &D,
        errors: &mut FieldErrors,
        field: &str,
        name: &str,
        ctx: &ValidationContext,
    ) -> Result<()>
    where
        D: LocationDirectory + ?Sized,
    {
        if !self.passes(directory, name, ctx).await? {
            errors.add(field, self.message());
        }
        Ok(())
    }

    pub fn message(&self) -> String {
        match self.kind.parent() {
            None => "The name has already been taken.".to_string(),
            Some(parent) => format!("The name has already been taken in this {}.", parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::shared::test_helpers::InMemoryDirectory;
    use serde_json::json;

    #[tokio::test]
    async fn test_same_name_under_same_parent_fails() {
        let directory = InMemoryDirectory::new();
        let country_a = directory.add(LocationKind::Country, "Iran", None);
        directory.add(LocationKind::Province, "Tehran", Some(country_a));

        let ctx =
            ValidationContext::from_payload(&json!({"name": "Tehran", "country_id": country_a}));
        let rule = UniqueName::new(LocationKind::Province);
        assert!(!rule.passes(&directory, "Tehran", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_name_under_different_parent_passes() {
        let directory = InMemoryDirectory::new();
        let country_a = directory.add(LocationKind::Country, "Iran", None);
        let country_b = directory.add(LocationKind::Country, "Armenia", None);
        directory.add(LocationKind::Province, "Tehran", Some(country_a));

        let ctx = ValidationContext::from_payload(&json!({"country_id": country_b}));
        let rule = UniqueName::new(LocationKind::Province);
        assert!(rule.passes(&directory, "Tehran", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_every_scoped_level_is_checked_against_its_own_parent() {
        let directory = InMemoryDirectory::new();
        let city = directory.add(LocationKind::City, "Shiraz", Some(Uuid::now_v7()));
        let other_city = directory.add(LocationKind::City, "Yazd", Some(Uuid::now_v7()));
        directory.add(LocationKind::District, "Zand", Some(city));

        let rule = UniqueName::new(LocationKind::District);
        let same = ValidationContext::from_payload(&json!({"city_id": city}));
        let other = ValidationContext::from_payload(&json!({"city_id": other_city}));

        assert!(!rule.passes(&directory, "Zand", &same).await.unwrap());
        assert!(rule.passes(&directory, "Zand", &other).await.unwrap());
    }

    #[tokio::test]
    async fn test_country_names_are_global() {
        let directory = InMemoryDirectory::new();
        directory.add(LocationKind::Country, "Iran", None);

        let rule = UniqueName::new(LocationKind::Country);
        let ctx = ValidationContext::default();
        assert!(!rule.passes(&directory, "Iran", &ctx).await.unwrap());
        assert!(rule.passes(&directory, "Iraq", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_renaming_to_own_name_passes() {
        let directory = InMemoryDirectory::new();
        let province = Uuid::now_v7();
        let city = directory.add(LocationKind::City, "Tehran", Some(province));

        let ctx = ValidationContext::from_payload(&json!({"province_id": province}));
        let rule = UniqueName::new(LocationKind::City).ignore(city);
        assert!(rule.passes(&directory, "Tehran", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_explicit_parent_wins_over_payload() {
        let directory = InMemoryDirectory::new();
        let country_a = Uuid::now_v7();
        let country_b = Uuid::now_v7();
        directory.add(LocationKind::Province, "Fars", Some(country_a));

        let ctx = ValidationContext::from_payload(&json!({"country_id": country_b}));
        let rule = UniqueName::new(LocationKind::Province).within(country_a);
        assert!(!rule.passes(&directory, "Fars", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_deleted_siblings_are_ignored() {
        let directory = InMemoryDirectory::new();
        let country = Uuid::now_v7();
        directory.add_trashed(LocationKind::Province, "Qom", Some(country));

        let ctx = ValidationContext::from_payload(&json!({"country_id": country}));
        let rule = UniqueName::new(LocationKind::Province);
        assert!(rule.passes(&directory, "Qom", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_parent_skips_lookup() {
        let directory = InMemoryDirectory::new();
        directory.add(LocationKind::Province, "Gilan", Some(Uuid::now_v7()));

        let rule = UniqueName::new(LocationKind::Province);
        assert!(rule.scope("Gilan", &ValidationContext::default()).is_none());
        assert!(rule
            .passes(&directory, "Gilan", &ValidationContext::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_validate_records_error_on_field() {
        let directory = InMemoryDirectory::new();
        directory.add(LocationKind::Country, "Iran", None);

        let mut errors = FieldErrors::default();
        UniqueName::new(LocationKind::Country)
            .validate(&directory, &mut errors, "name", "Iran", &ValidationContext::default())
            .await
            .unwrap();
        assert_eq!(errors.get("name").unwrap(), ["The name has already been taken."]);
    }

    #[test]
    fn test_unsupported_model_is_configuration_fault() {
        let err = UniqueName::for_model("App\\Models\\User").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(UniqueName::for_model("location_district").is_ok());
    }
}
