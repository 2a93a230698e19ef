use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::config::TableNames;
use crate::core::error::AppError;
use crate::features::events::EntityKind;

/// Level of the location hierarchy: country → province → city → district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Country,
    Province,
    City,
    District,
}

impl LocationKind {
    pub const ALL: [LocationKind; 4] = [
        LocationKind::Country,
        LocationKind::Province,
        LocationKind::City,
        LocationKind::District,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LocationKind::Country => "country",
            LocationKind::Province => "province",
            LocationKind::City => "city",
            LocationKind::District => "district",
        }
    }

    pub fn label(&self) -> &'static str {
        self.entity().label()
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            LocationKind::Country => EntityKind::Country,
            LocationKind::Province => EntityKind::Province,
            LocationKind::City => EntityKind::City,
            LocationKind::District => EntityKind::District,
        }
    }

    /// The level directly above, if any
    pub fn parent(&self) -> Option<LocationKind> {
        match self {
            LocationKind::Country => None,
            LocationKind::Province => Some(LocationKind::Country),
            LocationKind::City => Some(LocationKind::Province),
            LocationKind::District => Some(LocationKind::City),
        }
    }

    /// Column other tables use to reference this level
    pub fn foreign_key(&self) -> &'static str {
        match self {
            LocationKind::Country => "country_id",
            LocationKind::Province => "province_id",
            LocationKind::City => "city_id",
            LocationKind::District => "district_id",
        }
    }

    /// Column that bounds the sibling set for name uniqueness; `None` means
    /// names are unique across the whole table.
    pub fn scope_column(&self) -> Option<&'static str> {
        self.parent().map(|parent| parent.foreign_key())
    }

    pub fn table<'a>(&self, tables: &'a TableNames) -> &'a str {
        match self {
            LocationKind::Country => &tables.countries,
            LocationKind::Province => &tables.provinces,
            LocationKind::City => &tables.cities,
            LocationKind::District => &tables.districts,
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LocationKind {
    type Err = AppError;

    /// Accepts the plain key (`city`) or the prefixed model name
    /// (`location_city`), case-insensitively. Anything else is a programming
    /// error on the caller's side, not bad user input.
    fn from_str(model: &str) -> Result<Self, Self::Err> {
        let normalized = model.trim().to_ascii_lowercase();
        let key = normalized
            .strip_prefix("location_")
            .unwrap_or(normalized.as_str());

        LocationKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "Unique name rule does not support model '{}'",
                    model
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_columns() {
        assert_eq!(LocationKind::Country.scope_column(), None);
        assert_eq!(LocationKind::Province.scope_column(), Some("country_id"));
        assert_eq!(LocationKind::City.scope_column(), Some("province_id"));
        assert_eq!(LocationKind::District.scope_column(), Some("city_id"));
    }

    #[test]
    fn test_parse_model_names() {
        assert_eq!("city".parse::<LocationKind>().unwrap(), LocationKind::City);
        assert_eq!(
            "Location_Province".parse::<LocationKind>().unwrap(),
            LocationKind::Province
        );
    }

    #[test]
    fn test_unsupported_model_is_configuration_error() {
        let err = "user".parse::<LocationKind>().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        let err = "geo_area".parse::<LocationKind>().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_tables() {
        let tables = TableNames::default();
        assert_eq!(LocationKind::District.table(&tables), "districts");
        assert_eq!(LocationKind::Country.table(&tables), "countries");
    }
}
