use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::query::{ListQuery, SortSpec};

/// What an entity allows a list request to do
#[derive(Debug, Clone)]
pub struct ListSpec<'a> {
    pub table: &'a str,
    pub sortable: &'static [&'static str],
    pub default_sort: SortSpec,
    /// `filter[...]` keys the entity accepts
    pub filters: &'static [&'static str],
    /// SQL expression matched by `filter[name]`
    pub search: Option<&'static str>,
    /// Rows must belong to this parent
    pub parent: Option<(&'static str, Uuid)>,
}

/// SQL fragments for one list request, with bind order
/// `[pattern], [parent_id], limit, offset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPlan {
    pub where_clause: String,
    pub order_by: String,
    pub pattern: Option<String>,
    pub parent_id: Option<Uuid>,
    /// Placeholder number of the LIMIT parameter
    pub limit_param: usize,
}

impl ListSpec<'_> {
    /// Validates the request and prepares the SQL. Fails before any database
    /// access when the sort or a filter is not allowed.
    pub fn plan(&self, query: &ListQuery) -> Result<ListPlan> {
        if let Some(key) = query
            .given_filters()
            .into_iter()
            .find(|key| !self.filters.contains(key))
        {
            return Err(AppError::BadRequest(format!(
                "Requested filter '{}' is not allowed. Allowed filters are {}",
                key,
                self.filters.join(", ")
            )));
        }
        let sort = SortSpec::parse(query.sort.as_deref(), self.sortable, self.default_sort)?;

        let mut conditions: Vec<String> = Vec::new();
        let mut param = 0;

        if let Some(condition) = query.trashed_condition() {
            conditions.push(condition.to_string());
        }
        if let Some(status) = query.filter_status {
            conditions.push(format!("status = {}", status));
        }

        let pattern = self.search.and(query.name_pattern());
        if let (Some(expression), Some(_)) = (self.search, &pattern) {
            param += 1;
            conditions.push(format!("LOWER({}) LIKE ${}", expression, param));
        }

        let parent_id = self.parent.map(|(column, id)| {
            param += 1;
            conditions.push(format!("{} = ${}", column, param));
            id
        });

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Ok(ListPlan {
            where_clause,
            order_by: SortSpec::order_by(&sort),
            pattern,
            parent_id,
            limit_param: param + 1,
        })
    }
}

/// Fetches one page of rows and the total matching count
pub async fn fetch_page<T>(
    pool: &PgPool,
    spec: &ListSpec<'_>,
    query: &ListQuery,
) -> Result<(Vec<T>, i64)>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let plan = spec.plan(query)?;

    let count_query = format!("SELECT COUNT(*) FROM {} {}", spec.table, plan.where_clause);
    let mut count = sqlx::query_scalar::<_, i64>(&count_query);
    if let Some(pattern) = &plan.pattern {
        count = count.bind(pattern);
    }
    if let Some(parent_id) = plan.parent_id {
        count = count.bind(parent_id);
    }
    let total = count.fetch_one(pool).await.map_err(|e| {
        tracing::error!("Failed to count {}: {:?}", spec.table, e);
        AppError::Database(e)
    })?;

    let rows_query = format!(
        "SELECT * FROM {} {} ORDER BY {} LIMIT ${} OFFSET ${}",
        spec.table,
        plan.where_clause,
        plan.order_by,
        plan.limit_param,
        plan.limit_param + 1
    );
    let mut rows = sqlx::query_as::<_, T>(&rows_query);
    if let Some(pattern) = &plan.pattern {
        rows = rows.bind(pattern);
    }
    if let Some(parent_id) = plan.parent_id {
        rows = rows.bind(parent_id);
    }
    let rows = rows
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list {}: {:?}", spec.table, e);
            AppError::Database(e)
        })?;

    Ok((rows, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::query::TrashedFilter;

    fn spec(parent: Option<(&'static str, Uuid)>) -> ListSpec<'static> {
        ListSpec {
            table: "cities",
            sortable: &["name", "status"],
            default_sort: SortSpec::asc("name"),
            filters: &["name", "status", "trashed", "province_id"],
            search: Some("name"),
            parent,
        }
    }

    #[test]
    fn test_default_plan_hides_trashed_rows() {
        let plan = spec(None).plan(&ListQuery::default()).unwrap();
        assert_eq!(plan.where_clause, "WHERE deleted_at IS NULL");
        assert_eq!(plan.order_by, "name ASC, id ASC");
        assert_eq!(plan.limit_param, 1);
    }

    #[test]
    fn test_filters_number_their_parameters() {
        let province = Uuid::now_v7();
        let query = ListQuery {
            filter_name: Some("Teh".to_string()),
            filter_status: Some(true),
            filter_trashed: Some(TrashedFilter::With),
            sort: Some("-status".to_string()),
            ..Default::default()
        };

        let plan = spec(Some(("province_id", province))).plan(&query).unwrap();
        assert_eq!(
            plan.where_clause,
            "WHERE status = true AND LOWER(name) LIKE $1 AND province_id = $2"
        );
        assert_eq!(plan.pattern.as_deref(), Some("%teh%"));
        assert_eq!(plan.parent_id, Some(province));
        assert_eq!(plan.order_by, "status DESC, id ASC");
        assert_eq!(plan.limit_param, 3);
    }

    #[test]
    fn test_only_trashed() {
        let query = ListQuery {
            filter_trashed: Some(TrashedFilter::Only),
            ..Default::default()
        };
        let plan = spec(None).plan(&query).unwrap();
        assert_eq!(plan.where_clause, "WHERE deleted_at IS NOT NULL");
    }

    #[test]
    fn test_unknown_sort_rejected_before_query() {
        let query = ListQuery {
            sort: Some("-password".to_string()),
            ..Default::default()
        };
        let err = spec(None).plan(&query).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_unknown_filter_rejected_before_query() {
        let query = ListQuery {
            filter_country_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        let err = spec(None).plan(&query).unwrap_err();
        match err {
            AppError::BadRequest(message) => assert!(message.contains("'country_id'")),
            other => panic!("expected bad request, got {:?}", other),
        }
    }
}
