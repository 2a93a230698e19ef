use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Visibility of soft-deleted rows in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrashedFilter {
    /// Live and soft-deleted rows
    With,
    /// Soft-deleted rows only
    Only,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters shared by every admin list endpoint.
///
/// `sort` is a comma separated list of columns, each optionally prefixed
/// with `-` for descending order (e.g. `-status,name`).
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Sort columns, e.g. `name` or `-created_at`
    #[param(example = "-created_at")]
    pub sort: Option<String>,

    /// Case-insensitive partial match on the name
    #[serde(rename = "filter[name]")]
    pub filter_name: Option<String>,

    /// Only active (true) or inactive (false) rows
    #[serde(rename = "filter[status]")]
    pub filter_status: Option<bool>,

    /// Include soft-deleted rows (`with`) or list only them (`only`)
    #[serde(rename = "filter[trashed]")]
    pub filter_trashed: Option<TrashedFilter>,

    /// Provinces of one country
    #[serde(rename = "filter[country_id]")]
    pub filter_country_id: Option<Uuid>,

    /// Cities of one province
    #[serde(rename = "filter[province_id]")]
    pub filter_province_id: Option<Uuid>,

    /// Districts of one city
    #[serde(rename = "filter[city_id]")]
    pub filter_city_id: Option<Uuid>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            filter_name: None,
            filter_status: None,
            filter_trashed: None,
            filter_country_id: None,
            filter_province_id: None,
            filter_city_id: None,
        }
    }
}

impl ListQuery {
    /// Calculate SQL OFFSET from page number, saturating for absurd pages
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Keys of the `filter[...]` parameters present on the request
    pub fn given_filters(&self) -> Vec<&'static str> {
        [
            ("name", self.filter_name.is_some()),
            ("status", self.filter_status.is_some()),
            ("trashed", self.filter_trashed.is_some()),
            ("country_id", self.filter_country_id.is_some()),
            ("province_id", self.filter_province_id.is_some()),
            ("city_id", self.filter_city_id.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, given)| given.then_some(key))
        .collect()
    }

    pub fn name_pattern(&self) -> Option<String> {
        self.filter_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()))
    }

    /// SQL fragment selecting rows by soft-delete state
    pub fn trashed_condition(&self) -> Option<&'static str> {
        match self.filter_trashed {
            None => Some("deleted_at IS NULL"),
            Some(TrashedFilter::With) => None,
            Some(TrashedFilter::Only) => Some("deleted_at IS NOT NULL"),
        }
    }
}

/// One `ORDER BY` term validated against an allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }

    /// Parses a `sort` parameter. Unknown columns are rejected rather than
    /// silently ignored; an absent or blank parameter yields `default`.
    pub fn parse(
        raw: Option<&str>,
        allowed: &[&'static str],
        default: SortSpec,
    ) -> Result<Vec<SortSpec>> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(vec![default]);
        };

        let mut specs: Vec<SortSpec> = Vec::new();
        for term in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, direction) = match term.strip_prefix('-') {
                Some(rest) => (rest, SortDirection::Desc),
                None => (term, SortDirection::Asc),
            };

            let column = allowed
                .iter()
                .copied()
                .find(|candidate| *candidate == name)
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Requested sort '{}' is not allowed. Allowed sorts are {}",
                        name,
                        allowed.join(", ")
                    ))
                })?;

            if specs.iter().all(|s| s.column != column) {
                specs.push(SortSpec { column, direction });
            }
        }

        if specs.is_empty() {
            specs.push(default);
        }
        Ok(specs)
    }

    /// `ORDER BY` body for a list of specs, always ending with `id` so
    /// pagination is stable
    pub fn order_by(specs: &[SortSpec]) -> String {
        let mut terms: Vec<String> = specs
            .iter()
            .map(|s| format!("{} {}", s.column, s.direction.as_sql()))
            .collect();
        if specs.iter().all(|s| s.column != "id") {
            terms.push("id ASC".to_string());
        }
        terms.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["name", "status", "created_at"];

    #[test]
    fn test_sort_defaults_when_absent() {
        let specs = SortSpec::parse(None, ALLOWED, SortSpec::asc("name")).unwrap();
        assert_eq!(specs, vec![SortSpec::asc("name")]);

        let specs = SortSpec::parse(Some("  "), ALLOWED, SortSpec::desc("created_at")).unwrap();
        assert_eq!(specs, vec![SortSpec::desc("created_at")]);
    }

    #[test]
    fn test_sort_descending_prefix() {
        let specs = SortSpec::parse(Some("-name"), ALLOWED, SortSpec::asc("name")).unwrap();
        assert_eq!(specs, vec![SortSpec::desc("name")]);
    }

    #[test]
    fn test_sort_multiple_terms_first_wins() {
        let specs = SortSpec::parse(
            Some("-status, name,-name"),
            ALLOWED,
            SortSpec::asc("name"),
        )
        .unwrap();
        assert_eq!(specs, vec![SortSpec::desc("status"), SortSpec::asc("name")]);
        assert_eq!(SortSpec::order_by(&specs), "status DESC, name ASC, id ASC");
    }

    #[test]
    fn test_sort_unknown_column_rejected() {
        let err = SortSpec::parse(Some("password"), ALLOWED, SortSpec::asc("name")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = SortSpec::parse(Some("name; DROP"), ALLOWED, SortSpec::asc("name")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_pagination_clamps() {
        let query = ListQuery {
            page: 0,
            page_size: 1000,
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = ListQuery {
            page: 3,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let query = ListQuery {
            page: i64::MAX,
            page_size: 100,
            ..Default::default()
        };
        assert_eq!(query.offset(), i64::MAX);

        let query = ListQuery {
            page: i64::MIN,
            ..Default::default()
        };
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_given_filters_lists_present_keys() {
        assert!(ListQuery::default().given_filters().is_empty());

        let query = ListQuery {
            filter_status: Some(false),
            filter_city_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        assert_eq!(query.given_filters(), vec!["status", "city_id"]);
    }

    #[test]
    fn test_name_pattern_and_trashed() {
        let query = ListQuery {
            filter_name: Some(" TehRan ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.name_pattern().as_deref(), Some("%tehran%"));
        assert_eq!(query.trashed_condition(), Some("deleted_at IS NULL"));

        let query = ListQuery {
            filter_trashed: Some(TrashedFilter::Only),
            ..Default::default()
        };
        assert_eq!(query.name_pattern(), None);
        assert_eq!(query.trashed_condition(), Some("deleted_at IS NOT NULL"));
    }

    #[test]
    fn test_list_query_from_query_string() {
        let query: ListQuery = serde_urlencoded_from(
            "page=2&sort=-name&filter%5Bname%5D=teh&filter%5Bstatus%5D=true&filter%5Btrashed%5D=with",
        );
        assert_eq!(query.page, 2);
        assert_eq!(query.sort.as_deref(), Some("-name"));
        assert_eq!(query.filter_name.as_deref(), Some("teh"));
        assert_eq!(query.filter_status, Some(true));
        assert_eq!(query.filter_trashed, Some(TrashedFilter::With));
        assert_eq!(query.trashed_condition(), None);
    }

    fn serde_urlencoded_from(raw: &str) -> ListQuery {
        let uri: axum::http::Uri = format!("/x?{}", raw).parse().unwrap();
        axum::extract::Query::<ListQuery>::try_from_uri(&uri)
            .unwrap()
            .0
    }
}
