//! Versioned snapshot schema migrations.

use rusqlite::Connection;
use tracing::{info, warn};
use sh_core::error::{ShError, ShResult};
use sh_core::constants::SNAPSHOT_SCHEMA_VERSION;

/// Run all pending migrations on the snapshot database.
pub fn run_migrations(conn: &Connection) -> ShResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= SNAPSHOT_SCHEMA_VERSION {
        return Ok(());
    }

    info!("migrating snapshot schema from version {current_version} to {SNAPSHOT_SCHEMA_VERSION}");

    for version in (current_version + 1)..=SNAPSHOT_SCHEMA_VERSION {
        run_migration(conn, version)?;
    }

    conn.execute("UPDATE schema_version SET version = ?1", [SNAPSHOT_SCHEMA_VERSION])
        .map_err(|e| ShError::Migration(e.to_string()))?;
    Ok(())
}

/// Current schema version; a fresh file starts at 0.
pub fn get_schema_version(conn: &Connection) -> ShResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| ShError::Migration(e.to_string()))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| ShError::Migration(e.to_string()))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .map_err(|e| ShError::Migration(e.to_string()))
}

fn run_migration(_conn: &Connection, version: i32) -> ShResult<()> {
    match version {
        // v1 is the base schema created by schema::create_tables
        1 => Ok(()),
        _ => {
            warn!("unknown snapshot migration version {version}, skipping");
            Ok(())
        }
    }
}
