//! Row-level access to a migration snapshot.

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sh_core::error::{ShError, ShResult};

use crate::db::SnapshotDb;

/// Summary of an export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRun {
    pub id: i64,
    pub source_url: String,
    pub host: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub table_counts: BTreeMap<String, u64>,
}

fn db_err(e: rusqlite::Error) -> ShError {
    ShError::Database(e.to_string())
}

/// Extract the primary key of an exported row.
///
/// Rows without an `id` column are keyed by their canonical JSON text.
pub fn row_key(row: &serde_json::Value) -> String {
    match row.get("id") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => row.to_string(),
    }
}

impl SnapshotDb {
    /// Insert or replace a batch of rows for one table. Returns rows written.
    pub fn put_rows(&self, table: &str, rows: &[serde_json::Value]) -> ShResult<usize> {
        let exported_at = Utc::now().to_rfc3339();
        self.transaction(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO snapshot_rows (table_name, row_id, payload, exported_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(db_err)?;
            for row in rows {
                stmt.execute(params![table, row_key(row), row.to_string(), exported_at])
                    .map_err(db_err)?;
            }
            Ok(rows.len())
        })
    }

    /// Read a page of rows for one table, ordered by row id.
    pub fn rows(&self, table: &str, offset: u64, limit: u64) -> ShResult<Vec<serde_json::Value>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT payload FROM snapshot_rows WHERE table_name = ?1
                 ORDER BY row_id LIMIT ?2 OFFSET ?3",
            )
            .map_err(db_err)?;
        let payloads = stmt
            .query_map(params![table, limit as i64, offset as i64], |r| r.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(ShError::from))
            .collect()
    }

    /// Number of rows stored for one table.
    pub fn count(&self, table: &str) -> ShResult<u64> {
        let conn = self.conn()?;
        count_table(&conn, table)
    }

    /// Row counts for every table present in the snapshot.
    pub fn table_counts(&self) -> ShResult<BTreeMap<String, u64>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT table_name, COUNT(*) FROM snapshot_rows GROUP BY table_name")
            .map_err(db_err)?;
        let counts = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as u64)))
            .map_err(db_err)?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(db_err)?;
        Ok(counts)
    }

    /// Delete all rows of one table (re-export starts clean).
    pub fn clear_table(&self, table: &str) -> ShResult<usize> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM snapshot_rows WHERE table_name = ?1", [table])
            .map_err(db_err)
    }

    /// Record the start of an export run and return its id.
    pub fn begin_export(&self, source_url: &str, host: &str) -> ShResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO export_runs (source_url, host, started_at) VALUES (?1, ?2, ?3)",
            params![source_url, host, Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Close an export run with its per-table counts.
    pub fn finish_export(&self, run_id: i64, counts: &BTreeMap<String, u64>) -> ShResult<()> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE export_runs SET finished_at = ?1, table_counts = ?2 WHERE id = ?3",
                params![Utc::now().to_rfc3339(), serde_json::to_string(counts)?, run_id],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(ShError::not_found("export run", run_id.to_string()));
        }
        Ok(())
    }

    /// Most recent export run, if any.
    pub fn latest_export(&self) -> ShResult<Option<ExportRun>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, source_url, host, started_at, finished_at, table_counts
                 FROM export_runs ORDER BY id DESC LIMIT 1",
                [],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, Option<String>>(4)?,
                        r.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        row.map(|(id, source_url, host, started_at, finished_at, counts)| {
            Ok(ExportRun {
                id,
                source_url,
                host,
                started_at,
                finished_at,
                table_counts: serde_json::from_str(&counts)?,
            })
        })
        .transpose()
    }
}

fn count_table(conn: &Connection, table: &str) -> ShResult<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM snapshot_rows WHERE table_name = ?1",
        [table],
        |r| r.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(db_err)
}
