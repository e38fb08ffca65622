//! The task record store contract and backend selection.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::db::Database;
use crate::error::StoreResult;
use crate::json_store::JsonFileTaskStore;
use crate::sqlite_store::SqliteTaskStore;
use crate::task::{Outcome, RetryPolicy, RowId, TaskRow};

/// Reads and writes task rows in a persistent tabular record set.
///
/// Implementations hold no cache: every call goes back to persistent
/// storage, so rows edited by hand between cycles are picked up on the next
/// load. Updates are read-modify-write with no cross-process locking.
#[async_trait]
pub trait TaskRecordStore: Send + Sync {
    /// Human-readable location of the backing store (path or URI).
    fn location(&self) -> String;

    /// Re-read the store and return the first pending row in stored order,
    /// or `None` when nothing is left to do.
    async fn load_next_pending(&self) -> StoreResult<Option<TaskRow>>;

    /// Record the outcome of one cycle on a single row.
    ///
    /// Sets `status` and `result` and increments the row's attempt counter.
    async fn persist(&self, id: RowId, outcome: Outcome, result: &str) -> StoreResult<()>;

    /// Every row in stored order.
    async fn list(&self) -> StoreResult<Vec<TaskRow>>;

    /// Append a new pending row and return its id.
    async fn append(&self, task_input: &str) -> StoreResult<RowId>;
}

/// Open the store at `location`.
///
/// Locations ending in `.json` are served by [`JsonFileTaskStore`]; anything
/// else is treated as a SQLite database file (created and migrated on first
/// use).
pub async fn open_store(
    location: impl AsRef<Path>,
    policy: RetryPolicy,
) -> StoreResult<Arc<dyn TaskRecordStore>> {
    let path = location.as_ref().to_path_buf();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        info!(path = %path.display(), backend = "json", "task store selected");
        return Ok(Arc::new(JsonFileTaskStore::new(path, policy)));
    }

    info!(path = %path.display(), backend = "sqlite", "task store selected");
    let display = path.display().to_string();
    let db = Database::open_and_migrate(path).await?;
    Ok(Arc::new(SqliteTaskStore::new(db, display, policy)))
}
