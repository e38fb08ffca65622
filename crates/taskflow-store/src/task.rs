//! Task row types shared by every store backend.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a row, assigned by the store.
///
/// SQLite uses the table's integer primary key; the JSON backend uses the
/// zero-based position in the row array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Never processed, or carrying a status this system does not own.
    Pending,
    /// Processed successfully.
    Done,
    /// Processed and failed.
    Failed,
}

impl TaskStatus {
    /// Interpret a stored status cell.
    ///
    /// Only the exact markers `done` and `failed` are recognized; anything
    /// else, including an empty or missing cell or a marker with stray
    /// whitespace, reads as [`TaskStatus::Pending`].
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            Some("done") => Self::Done,
            Some("failed") => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// The text written to the status column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Outcome written back to the store at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        self.status().as_str()
    }

    /// The row status this outcome produces.
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Done => TaskStatus::Done,
            Self::Failed => TaskStatus::Failed,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task row as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: RowId,
    /// Free-text task description. Not validated by the store: a row without
    /// it is forwarded as-is.
    pub task_input: Option<String>,
    pub status: TaskStatus,
    pub result: Option<String>,
    /// How many times an outcome has been persisted for this row.
    pub attempts: u32,
    /// Any further columns carried by the backing file.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, serde_json::Value>,
}

impl TaskRow {
    /// The task text, or an empty string when the column is missing.
    pub fn input(&self) -> &str {
        self.task_input.as_deref().unwrap_or_default()
    }
}

/// Decides which rows are still eligible for processing.
///
/// A `done` row is never eligible. A `failed` row stays eligible while its
/// attempt count is below `max_attempts`; `max_attempts == 0` keeps failed
/// rows eligible forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Failed rows are retried on every cycle without limit.
    pub fn unbounded() -> Self {
        Self { max_attempts: 0 }
    }

    pub fn is_pending(&self, status: TaskStatus, attempts: u32) -> bool {
        match status {
            TaskStatus::Pending => true,
            TaskStatus::Done => false,
            TaskStatus::Failed => self.max_attempts == 0 || attempts < self.max_attempts,
        }
    }

    pub fn is_row_pending(&self, row: &TaskRow) -> bool {
        self.is_pending(row.status, row.attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cell_parsing() {
        assert_eq!(TaskStatus::from_cell(None), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_cell(Some("")), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_cell(Some("done")), TaskStatus::Done);
        assert_eq!(TaskStatus::from_cell(Some("done ")), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_cell(Some(" failed")), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_cell(Some("failed")), TaskStatus::Failed);
        assert_eq!(TaskStatus::from_cell(Some("in progress")), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_cell(Some("DONE")), TaskStatus::Pending);
    }

    #[test]
    fn done_is_never_pending() {
        let policy = RetryPolicy::unbounded();
        assert!(!policy.is_pending(TaskStatus::Done, 0));
        assert!(policy.is_pending(TaskStatus::Pending, 99));
    }

    #[test]
    fn failed_rows_respect_max_attempts() {
        let policy = RetryPolicy::new(2);
        assert!(policy.is_pending(TaskStatus::Failed, 1));
        assert!(!policy.is_pending(TaskStatus::Failed, 2));
        assert!(RetryPolicy::unbounded().is_pending(TaskStatus::Failed, 1_000));
    }

    #[test]
    fn outcome_maps_to_status_text() {
        assert_eq!(Outcome::Done.as_str(), "done");
        assert_eq!(Outcome::Failed.status(), TaskStatus::Failed);
    }
}
