//! SQLite-backed task queue.
//!
//! Rows live in the `tasks` table created by the migrations. Stored order is
//! the integer primary key. Eligibility is decided in Rust with the same
//! [`RetryPolicy`] the JSON backend uses, so both backends agree on which
//! status text counts as pending.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::record_store::TaskRecordStore;
use crate::task::{Outcome, RetryPolicy, RowId, TaskRow, TaskStatus};

/// [`TaskRecordStore`] over a SQLite database.
#[derive(Clone)]
pub struct SqliteTaskStore {
    db: Database,
    location: String,
    policy: RetryPolicy,
}

impl SqliteTaskStore {
    /// Wrap an already-migrated database.
    pub fn new(db: Database, location: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            db,
            location: location.into(),
            policy,
        }
    }

    async fn read_all(&self) -> StoreResult<Vec<TaskRow>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, task_input, status, result, attempts FROM tasks ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(SqlTaskRow {
                            id: row.get(0)?,
                            task_input: row.get(1)?,
                            status: row.get(2)?,
                            result: row.get(3)?,
                            attempts: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows.into_iter().map(SqlTaskRow::into_task_row).collect())
            })
            .await
    }
}

#[async_trait]
impl TaskRecordStore for SqliteTaskStore {
    fn location(&self) -> String {
        self.location.clone()
    }

    #[instrument(skip(self), fields(location = %self.location))]
    async fn load_next_pending(&self) -> StoreResult<Option<TaskRow>> {
        let rows = self.read_all().await?;
        let total = rows.len();
        let next = rows.into_iter().find(|row| self.policy.is_row_pending(row));
        debug!(total, found = next.is_some(), "scanned task table");
        Ok(next)
    }

    #[instrument(skip(self, result), fields(location = %self.location))]
    async fn persist(&self, id: RowId, outcome: Outcome, result: &str) -> StoreResult<()> {
        let result = result.to_string();
        let now = Utc::now().timestamp();

        let changed = self
            .db
            .execute(move |conn| {
                let n = conn.execute(
                    "UPDATE tasks SET status = ?1, result = ?2, attempts = attempts + 1, \
                     updated_at = ?3 WHERE id = ?4",
                    rusqlite::params![outcome.as_str(), result, now, id.0],
                )?;
                Ok(n)
            })
            .await?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "task row",
                id: id.to_string(),
            });
        }

        debug!(row = %id, %outcome, "task row persisted");
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<TaskRow>> {
        self.read_all().await
    }

    #[instrument(skip(self, task_input), fields(location = %self.location))]
    async fn append(&self, task_input: &str) -> StoreResult<RowId> {
        let task_input = task_input.to_string();
        let now = Utc::now().timestamp();

        let id = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO tasks (task_input, status, result, attempts, updated_at) \
                     VALUES (?1, '', NULL, 0, ?2)",
                    rusqlite::params![task_input, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(row = id, "task row appended");
        Ok(RowId(id))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal row mapping
// ═══════════════════════════════════════════════════════════════════════

/// Raw column values as read from SQLite.
struct SqlTaskRow {
    id: i64,
    task_input: Option<String>,
    status: Option<String>,
    result: Option<String>,
    attempts: u32,
}

impl SqlTaskRow {
    fn into_task_row(self) -> TaskRow {
        TaskRow {
            id: RowId(self.id),
            task_input: self.task_input,
            status: TaskStatus::from_cell(self.status.as_deref()),
            result: self.result,
            attempts: self.attempts,
            columns: Default::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store(policy: RetryPolicy) -> SqliteTaskStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        SqliteTaskStore::new(db, ":memory:", policy)
    }

    #[tokio::test]
    async fn empty_table_has_nothing_pending() {
        let store = setup_store(RetryPolicy::default()).await;
        assert!(store.load_next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn returns_first_pending_in_stored_order() {
        let store = setup_store(RetryPolicy::default()).await;
        let first = store.append("first").await.unwrap();
        let second = store.append("second").await.unwrap();

        store.persist(first, Outcome::Done, "ok").await.unwrap();

        let next = store.load_next_pending().await.unwrap().unwrap();
        assert_eq!(next.id, second);
        assert_eq!(next.input(), "second");
        assert_eq!(next.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn persist_updates_status_result_and_attempts() {
        let store = setup_store(RetryPolicy::default()).await;
        let id = store.append("notes").await.unwrap();

        store.persist(id, Outcome::Failed, "boom").await.unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows[0].status, TaskStatus::Failed);
        assert_eq!(rows[0].result.as_deref(), Some("boom"));
        assert_eq!(rows[0].attempts, 1);
    }

    #[tokio::test]
    async fn persist_unknown_row_is_not_found() {
        let store = setup_store(RetryPolicy::default()).await;
        let err = store
            .persist(RowId(42), Outcome::Done, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn externally_inserted_null_status_is_pending() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO tasks (task_input, status) VALUES ('from a spreadsheet', NULL)",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let store = SqliteTaskStore::new(db, ":memory:", RetryPolicy::default());
        let row = store.load_next_pending().await.unwrap().unwrap();
        assert_eq!(row.input(), "from a spreadsheet");
        assert!(row.result.is_none());
    }
}
