//! Snapshot database initialization and connection pooling.
//!
//! The migration tooling exports backend rows into a local SQLite file
//! (WAL mode, r2d2 pool) and later imports them into another backend.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, error};

use sh_core::config::MigrationConfig;
use sh_core::error::{ShError, ShResult};

use crate::schema;
use crate::migrations;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled handle on a snapshot file.
#[derive(Clone)]
pub struct SnapshotDb {
    pool: Arc<DbPool>,
}

impl SnapshotDb {
    /// Open (or create) the snapshot at `db_path`, creating parent
    /// directories, applying the schema and pending migrations.
    pub fn open(db_path: &Path, config: &MigrationConfig) -> ShResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("opening snapshot database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer))
            .build(manager)
            .map_err(|e| ShError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.run_integrity_check()?;

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> ShResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| ShError::Pool(e.to_string()))
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> ShResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| ShError::Database(e.to_string()))?;

        if result != "ok" {
            error!("snapshot integrity check failed: {result}");
            return Err(ShError::IntegrityCheck(result));
        }
        Ok(())
    }

    /// Execute a function within a database transaction.
    pub fn transaction<T, F>(&self, f: F) -> ShResult<T>
    where
        F: FnOnce(&Connection) -> ShResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| ShError::Database(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| ShError::Database(e.to_string()))?;

        Ok(result)
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;",
        )
    }
}
