//! JSON-file task queue.
//!
//! The backing file is a JSON array of row objects:
//!
//! ```json
//! [
//!   { "task_input": "notes", "status": "", "result": null },
//!   { "task_input": "capital of France?", "status": "done", "result": "Paris" }
//! ]
//! ```
//!
//! Every call reads the whole file and every write rewrites the whole file.
//! A row's id is its position in the array. Columns this system does not own
//! are carried through rewrites untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{StoreError, StoreResult};
use crate::record_store::TaskRecordStore;
use crate::task::{Outcome, RetryPolicy, RowId, TaskRow, TaskStatus};

/// [`TaskRecordStore`] over a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileTaskStore {
    path: PathBuf,
    policy: RetryPolicy,
}

impl JsonFileTaskStore {
    pub fn new(path: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> StoreResult<Vec<JsonRecord>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Rewrite the whole file. Goes through a sibling temp file and a rename
    /// so a crash mid-write never leaves a truncated queue behind.
    async fn write_records(&self, records: &[JsonRecord]) -> StoreResult<()> {
        let body = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl TaskRecordStore for JsonFileTaskStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_next_pending(&self) -> StoreResult<Option<TaskRow>> {
        let records = self.read_records().await?;
        let total = records.len();
        let next = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_task_row(index))
            .find(|row| self.policy.is_row_pending(row));
        debug!(total, found = next.is_some(), "scanned task file");
        Ok(next)
    }

    #[instrument(skip(self, result), fields(path = %self.path.display()))]
    async fn persist(&self, id: RowId, outcome: Outcome, result: &str) -> StoreResult<()> {
        let mut records = self.read_records().await?;

        let record = usize::try_from(id.0)
            .ok()
            .and_then(|index| records.get_mut(index))
            .ok_or_else(|| StoreError::NotFound {
                entity: "task row",
                id: id.to_string(),
            })?;

        record.status = Some(Value::String(outcome.as_str().to_string()));
        record.result = Some(Value::String(result.to_string()));
        record.attempts += 1;

        self.write_records(&records).await?;
        debug!(row = %id, %outcome, "task row persisted");
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<TaskRow>> {
        let records = self.read_records().await?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_task_row(index))
            .collect())
    }

    #[instrument(skip(self, task_input), fields(path = %self.path.display()))]
    async fn append(&self, task_input: &str) -> StoreResult<RowId> {
        let mut records = if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            self.read_records().await?
        } else {
            Vec::new()
        };

        records.push(JsonRecord {
            task_input: Some(Value::String(task_input.to_string())),
            status: Some(Value::String(String::new())),
            result: None,
            attempts: 0,
            extra: BTreeMap::new(),
        });
        let id = RowId((records.len() - 1) as i64);

        self.write_records(&records).await?;
        debug!(row = %id, "task row appended");
        Ok(id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  On-disk row shape
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task_input: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "is_zero")]
    attempts: u32,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl JsonRecord {
    fn into_task_row(self, index: usize) -> TaskRow {
        let status = cell_text(self.status.as_ref());
        TaskRow {
            id: RowId(index as i64),
            task_input: cell_text(self.task_input.as_ref()),
            status: TaskStatus::from_cell(status.as_deref()),
            result: cell_text(self.result.as_ref()),
            attempts: self.attempts,
            columns: self.extra,
        }
    }
}

/// Spreadsheet exports put numbers and booleans in text columns; read them
/// as their JSON text. `null` is an empty cell.
fn cell_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
