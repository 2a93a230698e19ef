use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::core::error::{handle_db_error, AppError, Result};
use crate::features::events::models::changed_fields;
use crate::features::events::{EntityKind, EventBus, LifecycleEvent, LifecyclePhase};
use crate::shared::bulk::{BulkAction, BulkActionDto, BulkActionResultDto, BulkFailureDto};

/// Rows that carry an id and a soft-delete marker
pub trait SoftDeletable {
    fn id(&self) -> Uuid;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
}

/// Lifecycle of one record.
///
/// `Gone` is terminal: the row no longer exists, so every further action
/// reports not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    SoftDeleted,
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleTransition {
    Delete,
    Restore,
    ForceDelete,
}

impl LifecycleState {
    pub fn of<T: SoftDeletable>(row: Option<&T>) -> Self {
        match row {
            None => LifecycleState::Gone,
            Some(row) if row.deleted_at().is_some() => LifecycleState::SoftDeleted,
            Some(_) => LifecycleState::Active,
        }
    }

    /// The state after `transition`, or the error the caller should see
    pub fn apply(self, transition: LifecycleTransition, label: &str) -> Result<LifecycleState> {
        use LifecycleState::*;
        use LifecycleTransition::*;

        match (self, transition) {
            (Active, Delete) => Ok(SoftDeleted),
            (SoftDeleted, Restore) => Ok(Active),
            (Active | SoftDeleted, ForceDelete) => Ok(Gone),
            (Active, Restore) => Err(AppError::BadRequest(format!("{} is not deleted", label))),
            // Soft-deleted rows are invisible to a plain delete
            (SoftDeleted, Delete) | (Gone, _) => {
                Err(AppError::NotFound(format!("{} not found", label)))
            }
        }
    }
}

/// One successful lifecycle write. `before` is kept for status changes.
#[derive(Debug)]
pub struct Applied<T> {
    pub phase: LifecyclePhase,
    pub before: Option<T>,
    pub row: T,
}

impl<T> Applied<T> {
    pub fn new(phase: LifecyclePhase, row: T) -> Self {
        Self {
            phase,
            before: None,
            row,
        }
    }
}

/// Soft-delete aware persistence shared by every entity table.
///
/// Owns the delete/restore/force-delete/status writes and publishes the
/// matching lifecycle events.
pub struct SoftDeletes<T> {
    pool: PgPool,
    table: String,
    entity: EntityKind,
    events: Arc<EventBus>,
    _row: PhantomData<fn() -> T>,
}

impl<T> SoftDeletes<T>
where
    T: for<'r> FromRow<'r, PgRow> + SoftDeletable + Serialize + Send + Unpin,
{
    pub fn new(pool: PgPool, table: &str, entity: EntityKind, events: Arc<EventBus>) -> Self {
        Self {
            pool,
            table: table.to_string(),
            entity,
            events,
            _row: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn label(&self) -> &'static str {
        self.entity.label()
    }

    pub async fn find_with_trashed(&self, id: Uuid) -> Result<Option<T>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", self.table);
        sqlx::query_as::<_, T>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch {} {}: {:?}", self.entity.key(), id, e);
                AppError::Database(e)
            })
    }

    /// Fetch a live (not soft-deleted) row
    pub async fn find(&self, id: Uuid) -> Result<T> {
        self.find_with_trashed(id)
            .await?
            .filter(|row| row.deleted_at().is_none())
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", self.label(), id)))
    }

    /// Move a live row to the trash
    async fn delete(&self, id: Uuid) -> Result<Applied<T>> {
        let current = self.find_with_trashed(id).await?;
        LifecycleState::of(current.as_ref()).apply(LifecycleTransition::Delete, self.label())?;

        let query = format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.table
        );
        let row = self.write_one(&query, id).await?;
        Ok(Applied::new(LifecyclePhase::Deleted, row))
    }

    /// Bring a soft-deleted row back
    async fn restore(&self, id: Uuid) -> Result<Applied<T>> {
        let current = self.find_with_trashed(id).await?;
        LifecycleState::of(current.as_ref()).apply(LifecycleTransition::Restore, self.label())?;

        let query = format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NOT NULL RETURNING *",
            self.table
        );
        let row = self.write_one(&query, id).await?;
        Ok(Applied::new(LifecyclePhase::Restored, row))
    }

    /// Remove a row permanently, whether live or trashed
    async fn force_delete(&self, id: Uuid) -> Result<Applied<T>> {
        let current = self.find_with_trashed(id).await?;
        LifecycleState::of(current.as_ref())
            .apply(LifecycleTransition::ForceDelete, self.label())?;

        let query = format!("DELETE FROM {} WHERE id = $1 RETURNING *", self.table);
        let row = self.write_one(&query, id).await?;
        Ok(Applied::new(LifecyclePhase::ForceDeleted, row))
    }

    /// Activate or deactivate a live row. The result keeps the prior row so
    /// the update event can carry the changed fields.
    async fn set_status(&self, id: Uuid, status: bool) -> Result<Applied<T>> {
        let before = self.find(id).await?;

        let query = format!(
            "UPDATE {} SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            self.table
        );
        let after = sqlx::query_as::<_, T>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} with id {} not found", self.label(), id))
            })?;

        Ok(Applied {
            phase: LifecyclePhase::Updated,
            before: Some(before),
            row: after,
        })
    }

    /// Run one action against one id without publishing anything
    pub async fn apply(&self, action: BulkAction, id: Uuid) -> Result<Applied<T>> {
        match action {
            BulkAction::Delete => self.delete(id).await,
            BulkAction::Restore => self.restore(id).await,
            BulkAction::ForceDelete => self.force_delete(id).await,
            BulkAction::Activate => self.set_status(id, true).await,
            BulkAction::Deactivate => self.set_status(id, false).await,
        }
    }

    /// Apply one action to many ids and publish the row events
    pub async fn bulk(&self, dto: &BulkActionDto) -> Result<BulkActionResultDto> {
        self.bulk_with(dto, |applied| self.publish(applied)).await
    }

    /// Apply one action to many ids, collecting per-id failures and handing
    /// every successful write to `publish`.
    ///
    /// Expected failures (missing, wrong state, constraint conflicts) are
    /// reported per id; database faults abort the whole batch.
    pub async fn bulk_with<F>(
        &self,
        dto: &BulkActionDto,
        mut publish: F,
    ) -> Result<BulkActionResultDto>
    where
        F: FnMut(Applied<T>),
    {
        let mut result = BulkActionResultDto::default();

        for id in &dto.ids {
            match self.apply(dto.action, *id).await {
                Ok(applied) => {
                    publish(applied);
                    result.succeeded.push(*id);
                }
                Err(
                    e @ (AppError::NotFound(_)
                    | AppError::BadRequest(_)
                    | AppError::Conflict(_)
                    | AppError::FieldValidation(_)),
                ) => result.failed.push(BulkFailureDto {
                    id: *id,
                    message: e.to_string(),
                }),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Bulk {:?} on {}: {} succeeded, {} failed",
            dto.action,
            self.table,
            result.succeeded.len(),
            result.failed.len()
        );
        Ok(result)
    }

    /// Publish the event for a write, with the row itself as payload
    pub fn publish(&self, applied: Applied<T>) {
        match &applied.before {
            Some(before) => self.emit_update(before, &applied.row),
            None => self.emit(applied.phase, &applied.row),
        }
    }

    pub fn emit(&self, phase: LifecyclePhase, row: &T) {
        self.events
            .publish(LifecycleEvent::new(self.entity, phase, row.id(), row));
    }

    /// Publish an update event carrying the changed-field map
    pub fn emit_update(&self, before: &T, after: &T) {
        let before_json = serde_json::to_value(before).unwrap_or_default();
        let after_json = serde_json::to_value(after).unwrap_or_default();
        let changes = changed_fields(&before_json, &after_json);

        self.events.publish(
            LifecycleEvent::new(self.entity, LifecyclePhase::Updated, after.id(), after)
                .with_changes(changes),
        );
    }

    async fn write_one(&self, query: &str, id: Uuid) -> Result<T> {
        sqlx::query_as::<_, T>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", self.label(), id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(Option<DateTime<Utc>>);

    impl SoftDeletable for Row {
        fn id(&self) -> Uuid {
            Uuid::nil()
        }

        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.0
        }
    }

    #[test]
    fn test_state_of_row() {
        assert_eq!(LifecycleState::of(Some(&Row(None))), LifecycleState::Active);
        assert_eq!(
            LifecycleState::of(Some(&Row(Some(Utc::now())))),
            LifecycleState::SoftDeleted
        );
        assert_eq!(LifecycleState::of::<Row>(None), LifecycleState::Gone);
    }

    #[test]
    fn test_delete_only_from_active() {
        let state = LifecycleState::Active.apply(LifecycleTransition::Delete, "City");
        assert_eq!(state.unwrap(), LifecycleState::SoftDeleted);

        let err = LifecycleState::SoftDeleted
            .apply(LifecycleTransition::Delete, "City")
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_restore_only_from_soft_deleted() {
        let state = LifecycleState::SoftDeleted.apply(LifecycleTransition::Restore, "City");
        assert_eq!(state.unwrap(), LifecycleState::Active);

        let err = LifecycleState::Active
            .apply(LifecycleTransition::Restore, "City")
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_force_delete_from_active_or_soft_deleted() {
        for state in [LifecycleState::Active, LifecycleState::SoftDeleted] {
            let next = state.apply(LifecycleTransition::ForceDelete, "City").unwrap();
            assert_eq!(next, LifecycleState::Gone);
        }
    }

    #[test]
    fn test_gone_is_terminal() {
        for transition in [
            LifecycleTransition::Delete,
            LifecycleTransition::Restore,
            LifecycleTransition::ForceDelete,
        ] {
            let err = LifecycleState::Gone.apply(transition, "City").unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }
}
