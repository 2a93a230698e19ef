use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::TableNames;
use crate::core::error::{AppError, Result};
use crate::features::locations::dtos::LocationOptionDto;
use crate::features::locations::models::LocationKind;

/// Upper bound on the parent choices offered by a form
const MAX_OPTIONS: i64 = 500;

/// A name-collision question: does a live sibling of `kind` already use
/// `name` under `parent_id`, ignoring `exclude_id`?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameScope {
    pub kind: LocationKind,
    pub name: String,
    /// Value of the kind's scope column; `None` for countries
    pub parent_id: Option<Uuid>,
    pub exclude_id: Option<Uuid>,
}

/// Read access to the location hierarchy needed by validation rules
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// Whether a row of `kind` with `id` is persisted. Soft-deleted rows count.
    async fn exists(&self, kind: LocationKind, id: Uuid) -> Result<bool>;

    /// Whether a live row already matches the scope
    async fn name_taken(&self, scope: &NameScope) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgLocationDirectory {
    pool: PgPool,
    tables: Arc<TableNames>,
}

impl PgLocationDirectory {
    pub fn new(pool: PgPool, tables: Arc<TableNames>) -> Self {
        Self { pool, tables }
    }

    /// Active, live rows of `kind` for a select box, optionally narrowed to
    /// one parent
    pub async fn options(
        &self,
        kind: LocationKind,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<LocationOptionDto>> {
        let table = kind.table(&self.tables);
        let scope = match (kind.scope_column(), parent_id) {
            (Some(column), Some(_)) => format!(" AND {} = $2", column),
            _ => String::new(),
        };
        let query = format!(
            "SELECT id, name FROM {} WHERE deleted_at IS NULL AND status = TRUE{} \
             ORDER BY name ASC LIMIT $1",
            table, scope
        );

        let mut q = sqlx::query_as::<_, LocationOptionDto>(&query).bind(MAX_OPTIONS);
        if kind.scope_column().is_some() {
            if let Some(parent_id) = parent_id {
                q = q.bind(parent_id);
            }
        }

        q.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to load {} options: {:?}", kind, e);
            AppError::Database(e)
        })
    }
}

#[async_trait]
impl LocationDirectory for PgLocationDirectory {
    async fn exists(&self, kind: LocationKind, id: Uuid) -> Result<bool> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            kind.table(&self.tables)
        );

        sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check {} {} exists: {:?}", kind, id, e);
                AppError::Database(e)
            })
    }

    async fn name_taken(&self, scope: &NameScope) -> Result<bool> {
        let mut query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE deleted_at IS NULL AND name = $1",
            scope.kind.table(&self.tables)
        );
        let mut param = 1;

        let parent = scope.kind.scope_column().zip(scope.parent_id);
        if let Some((column, _)) = parent {
            param += 1;
            query.push_str(&format!(" AND {} = ${}", column, param));
        }
        if scope.exclude_id.is_some() {
            param += 1;
            query.push_str(&format!(" AND id <> ${}", param));
        }
        query.push(')');

        let mut q = sqlx::query_scalar::<_, bool>(&query).bind(&scope.name);
        if let Some((_, parent_id)) = parent {
            q = q.bind(parent_id);
        }
        if let Some(exclude_id) = scope.exclude_id {
            q = q.bind(exclude_id);
        }

        q.fetch_one(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to check {} name uniqueness: {:?}", scope.kind, e);
            AppError::Database(e)
        })
    }
}
