//! Snapshot database schema.
//!
//! Rows are stored as raw JSON payloads keyed by (table, row id) so a
//! snapshot stays faithful to whatever columns the source backend had.

use rusqlite::Connection;
use sh_core::error::{ShError, ShResult};
use tracing::debug;

/// Create all snapshot tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> ShResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| ShError::Database(format!("failed to create schema: {e}")))?;
    debug!("snapshot schema verified");
    Ok(())
}

/// Drop all tables (used when a snapshot is reset before re-export).
pub fn drop_tables(conn: &Connection) -> ShResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS snapshot_rows;
         DROP TABLE IF EXISTS export_runs;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| ShError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- One exported backend row
CREATE TABLE IF NOT EXISTS snapshot_rows (
    table_name   TEXT NOT NULL,
    row_id       TEXT NOT NULL,
    payload      TEXT NOT NULL,
    exported_at  TEXT NOT NULL,
    PRIMARY KEY (table_name, row_id)
);

CREATE INDEX IF NOT EXISTS idx_snapshot_rows_table ON snapshot_rows(table_name);

-- One export invocation
CREATE TABLE IF NOT EXISTS export_runs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    source_url    TEXT NOT NULL,
    host          TEXT NOT NULL,
    started_at    TEXT NOT NULL,
    finished_at   TEXT,
    table_counts  TEXT NOT NULL DEFAULT '{}'
);
"#;
