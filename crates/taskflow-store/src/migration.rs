//! Schema migration system.
//!
//! Migrations are stored as static SQL strings keyed by version number.
//! The applied version is tracked in a `_migrations` table so every
//! migration runs exactly once per database file.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new migrations to the end of this array.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "task queue: task_input, status, result",
        sql: r#"
            CREATE TABLE tasks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                task_input  TEXT,
                status      TEXT,
                result      TEXT
            );
        "#,
    },
    Migration {
        version: 2,
        description: "bounded retry: attempt counter and last update time",
        sql: r#"
            ALTER TABLE tasks ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE tasks ADD COLUMN updated_at INTEGER;
            CREATE INDEX idx_tasks_status ON tasks(status);
        "#,
    },
];

// ── public API ───────────────────────────────────────────────────────

/// Run all pending migrations against `conn`.
///
/// This is a **synchronous** function: call it from `spawn_blocking`.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        debug!(current_version = current, "task schema is up to date");
        return Ok(());
    }

    info!(
        current_version = current,
        pending = pending.len(),
        "running pending migrations"
    );

    for migration in pending {
        apply(conn, migration).inspect_err(|err| {
            warn!(version = migration.version, %err, "migration failed, rolled back");
        })?;
    }

    Ok(())
}

/// Return the latest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| StoreError::Migration {
        version: 0,
        message: format!("failed to read current version: {e}"),
    })
}

// ── internals ────────────────────────────────────────────────────────

fn ensure_migrations_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(|e| StoreError::Migration {
        version: 0,
        message: format!("failed to create _migrations table: {e}"),
    })
}

/// Apply a single migration inside a transaction. The transaction rolls
/// back on drop, so a failed migration leaves no trace.
fn apply(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    let failed = |step: &str, e: rusqlite::Error| StoreError::Migration {
        version: migration.version,
        message: format!("{step}: {e}"),
    };

    info!(
        version = migration.version,
        description = migration.description,
        "applying migration"
    );

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| failed("failed to begin transaction", e))?;
    tx.execute_batch(migration.sql)
        .map_err(|e| failed("SQL execution failed", e))?;
    tx.execute(
        "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().timestamp()
        ],
    )
    .map_err(|e| failed("failed to record migration", e))?;
    tx.commit().map_err(|e| failed("failed to commit", e))?;

    debug!(version = migration.version, "migration applied");
    Ok(())
}

// ── tests ────────────────────────────────────────────────────────────
