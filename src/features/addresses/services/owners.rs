use std::collections::HashMap;

use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::addresses::models::{Owner, OwnerRelation};

/// Polymorphic owner table: one `(owner_type, owner_id)` per owned record
#[derive(Debug, Clone)]
pub struct OwnerTable {
    table: String,
    /// Column pointing at the owned record, e.g. `address_id`
    column: &'static str,
}

impl OwnerTable {
    pub fn new(table: &str, column: &'static str) -> Self {
        Self {
            table: table.to_string(),
            column,
        }
    }

    pub async fn owners_of(&self, pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, Owner>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT {} AS record_id, owner_type, owner_id FROM {} WHERE {} = ANY($1)",
            self.column, self.table, self.column
        );
        let relations = sqlx::query_as::<_, OwnerRelation>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load owners from {}: {:?}", self.table, e);
                AppError::Database(e)
            })?;

        Ok(relations
            .into_iter()
            .map(|relation| (relation.record_id, relation.owner))
            .collect())
    }

    pub async fn owner_of(&self, pool: &PgPool, id: Uuid) -> Result<Option<Owner>> {
        Ok(self.owners_of(pool, &[id]).await?.remove(&id))
    }

    /// Points `record_id` at `owner`, replacing any previous owner
    pub async fn attach(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record_id: Uuid,
        owner: &Owner,
    ) -> Result<()> {
        let delete = format!("DELETE FROM {} WHERE {} = $1", self.table, self.column);
        sqlx::query(&delete)
            .bind(record_id)
            .execute(&mut **tx)
            .await
            .map_err(handle_db_error)?;

        let insert = format!(
            "INSERT INTO {} (id, {}, owner_type, owner_id) VALUES ($1, $2, $3, $4)",
            self.table, self.column
        );
        sqlx::query(&insert)
            .bind(Uuid::now_v7())
            .bind(record_id)
            .bind(&owner.owner_type)
            .bind(&owner.owner_id)
            .execute(&mut **tx)
            .await
            .map_err(handle_db_error)?;
        Ok(())
    }

    /// Live records of `records_table` attached to `owner`, newest first
    pub async fn owned_by<T>(
        &self,
        pool: &PgPool,
        records_table: &str,
        owner: &Owner,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let query = format!(
            "SELECT r.* FROM {records} r JOIN {owners} o ON o.{column} = r.id \
             WHERE o.owner_type = $1 AND o.owner_id = $2 AND r.deleted_at IS NULL \
             ORDER BY r.created_at DESC, r.id ASC",
            records = records_table,
            owners = self.table,
            column = self.column
        );

        sqlx::query_as::<_, T>(&query)
            .bind(&owner.owner_type)
            .bind(&owner.owner_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to list {} of {} {}: {:?}",
                    records_table,
                    owner.owner_type,
                    owner.owner_id,
                    e
                );
                AppError::Database(e)
            })
    }
}
