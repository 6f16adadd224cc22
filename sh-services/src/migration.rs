//! Backend-to-backend data migration through a local snapshot.
//!
//! - Export: pages every table of the source backend into the SQLite
//!   snapshot, keyed by (table, row id), and records the run.
//! - Import: upserts snapshot rows into the target backend in batches,
//!   parents before children so foreign keys resolve.
//! - Stats: rows per table in the snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use sh_api::ApiClient;
use sh_core::config::ConfigHandle;
use sh_core::constants::tables;
use sh_core::error::{ShError, ShResult};
use sh_core::platform::Platform;
use sh_models::SnapshotDb;

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{impl_service, ServiceState};

/// Progress callback for export/import.
pub type MigrationProgressCallback = Box<dyn Fn(MigrationProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationPhase {
    Export,
    Import,
}

/// Rows handled so far for one table.
#[derive(Debug, Clone)]
pub struct MigrationProgress {
    pub phase: MigrationPhase,
    pub table: String,
    pub processed: u64,
    pub total: Option<u64>,
}

/// Result of an export or import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationSummary {
    pub tables: BTreeMap<String, u64>,
    pub total_rows: u64,
    pub dry_run: bool,
    /// Export run id in the snapshot, for exports.
    pub run_id: Option<i64>,
}

impl MigrationSummary {
    fn record(&mut self, table: &str, rows: u64) {
        self.tables.insert(table.to_string(), rows);
        self.total_rows += rows;
    }
}

/// Resolve a table selection into foreign-key order. `None` or an empty
/// selection means every table.
pub fn select_tables(selection: Option<&[String]>) -> ShResult<Vec<&'static str>> {
    let Some(selection) = selection.filter(|s| !s.is_empty()) else {
        return Ok(tables::ALL.to_vec());
    };
    if let Some(unknown) = selection.iter().find(|t| !tables::is_known(t.trim())) {
        return Err(ShError::InvalidInput(format!("unknown table '{unknown}'")));
    }
    Ok(tables::ALL
        .iter()
        .copied()
        .filter(|t| selection.iter().any(|s| s.trim() == *t))
        .collect())
}

pub struct MigrationService {
    state: ServiceState,
    config: ConfigHandle,
    event_bus: EventBus,
}

impl MigrationService {
    pub fn new(config: ConfigHandle, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            config,
            event_bus,
        }
    }

    /// Open the configured snapshot file.
    pub async fn open_snapshot(&self) -> ShResult<SnapshotDb> {
        let config = self.config.read().await;
        let path = config.effective_snapshot_path()?;
        SnapshotDb::open(&path, &config.migration)
    }

    fn report_progress(
        &self,
        progress: &Option<MigrationProgressCallback>,
        phase: MigrationPhase,
        table: &str,
        processed: u64,
        total: Option<u64>,
    ) {
        if let Some(cb) = progress {
            cb(MigrationProgress {
                phase,
                table: table.to_string(),
                processed,
                total,
            });
        }
        self.event_bus.emit(AppEvent::MigrationProgress {
            table: table.to_string(),
            processed,
            total,
        });
    }

    /// Copy every selected table of `source` into the snapshot.
    pub async fn export(
        &self,
        source: &ApiClient,
        snapshot: &SnapshotDb,
        selection: Option<&[String]>,
        progress: Option<MigrationProgressCallback>,
    ) -> ShResult<MigrationSummary> {
        let selected = select_tables(selection)?;
        let page_size = u64::from(self.config.read().await.migration.page_size.max(1));

        info!("exporting {} tables from {}", selected.len(), source.origin());
        let run_id = snapshot.begin_export(source.origin(), &Platform::host_label())?;
        let mut summary = MigrationSummary {
            run_id: Some(run_id),
            ..Default::default()
        };

        for table in selected {
            let total = match source.table_count(table).await {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!("could not count {table}: {e}");
                    None
                }
            };

            snapshot.clear_table(table)?;
            let mut offset = 0u64;
            loop {
                let page = source.fetch_page(table, offset, page_size).await?;
                let fetched = page.len() as u64;
                if fetched > 0 {
                    snapshot.put_rows(table, &page)?;
                }
                offset += fetched;
                self.report_progress(&progress, MigrationPhase::Export, table, offset, total);
                if fetched < page_size {
                    break;
                }
            }

            debug!("exported {offset} rows from {table}");
            summary.record(table, offset);
        }

        snapshot.finish_export(run_id, &summary.tables)?;
        info!("export complete: {} rows", summary.total_rows);
        self.event_bus.emit(AppEvent::MigrationComplete {
            rows: summary.total_rows,
            dry_run: false,
        });
        Ok(summary)
    }

    /// Upsert snapshot rows into `target`. With `dry_run` rows are read
    /// and counted but nothing is sent.
    pub async fn import(
        &self,
        target: &ApiClient,
        snapshot: &SnapshotDb,
        selection: Option<&[String]>,
        dry_run: bool,
        progress: Option<MigrationProgressCallback>,
    ) -> ShResult<MigrationSummary> {
        let selected = select_tables(selection)?;
        let batch_size = u64::from(self.config.read().await.migration.batch_size.max(1));

        info!(
            "importing {} tables into {}{}",
            selected.len(),
            target.origin(),
            if dry_run { " (dry run)" } else { "" }
        );
        let mut summary = MigrationSummary {
            dry_run,
            ..Default::default()
        };

        for table in selected {
            let total = snapshot.count(table)?;
            let mut offset = 0u64;
            while offset < total {
                let batch = snapshot.rows(table, offset, batch_size)?;
                if batch.is_empty() {
                    break;
                }
                if !dry_run {
                    target.upsert_rows(table, &batch).await?;
                }
                offset += batch.len() as u64;
                self.report_progress(&progress, MigrationPhase::Import, table, offset, Some(total));
            }

            debug!("imported {offset} rows into {table}");
            summary.record(table, offset);
        }

        info!("import complete: {} rows", summary.total_rows);
        self.event_bus.emit(AppEvent::MigrationComplete {
            rows: summary.total_rows,
            dry_run,
        });
        Ok(summary)
    }

    /// Rows per table in the snapshot, every known table listed.
    pub fn stats(&self, snapshot: &SnapshotDb) -> ShResult<BTreeMap<String, u64>> {
        let mut counts = snapshot.table_counts()?;
        for table in tables::ALL {
            counts.entry(table.to_string()).or_insert(0);
        }
        Ok(counts)
    }
}

impl_service!(MigrationService, "migration");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_tables() {
        assert_eq!(select_tables(None).unwrap(), tables::ALL.to_vec());
        assert_eq!(select_tables(Some(&[])).unwrap(), tables::ALL.to_vec());
    }

    #[test]
    fn test_selection_keeps_fk_order() {
        let selection = vec!["messages".to_string(), "countries".to_string(), "profiles".to_string()];
        assert_eq!(
            select_tables(Some(&selection)).unwrap(),
            vec!["countries", "profiles", "messages"]
        );
    }

    #[test]
    fn test_unknown_table_rejected() {
        let selection = vec!["auth.users".to_string()];
        assert!(matches!(
            select_tables(Some(&selection)),
            Err(ShError::InvalidInput(_))
        ));
    }
}
