//! # taskflow-store
//!
//! Task record storage for taskflow.
//!
//! A task queue is a tabular record set with at least the columns
//! `task_input`, `status` and `result`. Two backends implement the
//! [`TaskRecordStore`] contract:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  TaskRecordStore (load_next_pending/persist)  │
//! ├──────────────────────┬───────────────────────┤
//! │  SqliteTaskStore     │  JsonFileTaskStore     │
//! │  (rusqlite, WAL)     │  (whole-file rewrite)  │
//! ├──────────────────────┴───────────────────────┤
//! │  RetryPolicy: which rows are still pending   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use taskflow_store::{open_store, Outcome, RetryPolicy};
//!
//! let store = open_store("tasks.db", RetryPolicy::default()).await?;
//! if let Some(row) = store.load_next_pending().await? {
//!     store.persist(row.id, Outcome::Done, "handled").await?;
//! }
//! ```

pub mod db;
pub mod error;
pub mod json_store;
pub mod migration;
pub mod record_store;
pub mod sqlite_store;
pub mod task;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use json_store::JsonFileTaskStore;
pub use record_store::{TaskRecordStore, open_store};
pub use sqlite_store::SqliteTaskStore;
pub use task::{Outcome, RetryPolicy, RowId, TaskRow, TaskStatus};
