//! Data migration commands: export a backend into a snapshot, import a
//! snapshot into another backend, inspect a snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use sh_api::ApiClient;
use sh_core::config::{AppConfig, ConfigHandle};
use sh_core::error::ShResult;
use sh_models::SnapshotDb;
use sh_services::migration::{select_tables, MigrationPhase, MigrationProgress, MigrationService};
use sh_services::{MigrationSummary, SessionContext};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Copy backend tables into the local snapshot.
    Export {
        /// Config file of the source backend (defaults to the active config).
        #[arg(long)]
        source: Option<PathBuf>,
        /// Only these tables (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,
        /// Snapshot file (defaults to migration.snapshot_path).
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Upsert snapshot rows into a target backend.
    Import {
        /// Config file of the target backend.
        #[arg(long)]
        target: PathBuf,
        /// Read and count rows without sending anything.
        #[arg(long)]
        dry_run: bool,
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
        /// Only these tables (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,
        /// Snapshot file (defaults to migration.snapshot_path).
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Rows per table in the snapshot and the last export run.
    Stats {
        /// Snapshot file (defaults to migration.snapshot_path).
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

/// API client for the backend described by another config file.
fn client_from_file(path: &Path) -> ShResult<ApiClient> {
    let cfg = AppConfig::load_from_file(path)?;
    cfg.validate()?;
    ApiClient::new(&cfg.backend)
}

async fn open_snapshot(
    config: &ConfigHandle,
    migration: &MigrationService,
    path: Option<&Path>,
) -> ShResult<SnapshotDb> {
    match path {
        Some(p) => {
            let cfg = config.read().await;
            SnapshotDb::open(p, &cfg.migration)
        }
        None => migration.open_snapshot().await,
    }
}

fn selection(tables: &[String]) -> Option<&[String]> {
    if tables.is_empty() {
        None
    } else {
        Some(tables)
    }
}

fn print_summary(summary: &MigrationSummary, verb: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => super::print_json(summary),
        OutputFormat::Text => {
            let mut table = super::new_table(vec!["Table", "Rows"]);
            for (name, rows) in &summary.tables {
                table.add_row(vec![name.clone(), rows.to_string()]);
            }
            println!("{table}");
            let note = if summary.dry_run { " (dry run, nothing sent)" } else { "" };
            println!(
                "\n  {} {verb} {} rows{note}",
                style("OK").green().bold(),
                summary.total_rows
            );
        }
    }
}

pub async fn run(config: ConfigHandle, action: MigrateAction, format: OutputFormat) -> ShResult<()> {
    let registry = super::init_registry(&config, SessionContext::new()).await;
    let migration = registry.migration();

    match action {
        MigrateAction::Export { source, tables, snapshot } => {
            let client = match &source {
                Some(path) => client_from_file(path)?,
                None => registry.api_client()?,
            };
            let db = open_snapshot(&config, &migration, snapshot.as_deref()).await?;

            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            if matches!(format, OutputFormat::Json) {
                pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            }
            pb.enable_steady_tick(std::time::Duration::from_millis(100));

            let pb_clone = pb.clone();
            let progress_cb = Box::new(move |p: MigrationProgress| {
                let counted = match p.total {
                    Some(total) => format!("{}/{}", p.processed, total),
                    None => p.processed.to_string(),
                };
                pb_clone.set_message(format!("[export] {} {counted}", p.table));
            });

            let result = migration
                .export(&client, &db, selection(&tables), Some(progress_cb))
                .await;
            pb.finish_and_clear();
            print_summary(&result?, "Exported", format);
        }
        MigrateAction::Import { target, dry_run, yes, tables, snapshot } => {
            let client = client_from_file(&target)?;
            let db = open_snapshot(&config, &migration, snapshot.as_deref()).await?;

            let selected = select_tables(selection(&tables))?;
            let mut total = 0u64;
            for table in &selected {
                total += db.count(table)?;
            }

            if !dry_run && !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Upsert {total} rows into {}? Existing rows with the same id are overwritten.",
                        client.origin()
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            if matches!(format, OutputFormat::Json) {
                pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            }

            let done: Arc<Mutex<HashMap<String, u64>>> = Arc::new(Mutex::new(HashMap::new()));
            let pb_clone = pb.clone();
            let progress_cb = Box::new(move |p: MigrationProgress| {
                if p.phase != MigrationPhase::Import {
                    return;
                }
                let Ok(mut done) = done.lock() else {
                    return;
                };
                done.insert(p.table.clone(), p.processed);
                pb_clone.set_position(done.values().sum());
                pb_clone.set_message(p.table);
            });

            let result = migration
                .import(&client, &db, selection(&tables), dry_run, Some(progress_cb))
                .await;
            pb.finish_and_clear();
            print_summary(&result?, if dry_run { "Checked" } else { "Imported" }, format);
        }
        MigrateAction::Stats { snapshot } => {
            let db = open_snapshot(&config, &migration, snapshot.as_deref()).await?;
            let counts = migration.stats(&db)?;
            let last = db.latest_export()?;

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "tables": counts,
                    "latest_export": last,
                })),
                OutputFormat::Text => {
                    let mut table = super::new_table(vec!["Table", "Rows"]);
                    for (name, rows) in &counts {
                        table.add_row(vec![name.clone(), rows.to_string()]);
                    }
                    println!("{table}");
                    match last {
                        Some(run) => println!(
                            "\n  Last export #{} from {} on {} ({})",
                            run.id,
                            run.source_url,
                            run.host,
                            run.finished_at.as_deref().unwrap_or("unfinished")
                        ),
                        None => println!("\n  No export recorded."),
                    }
                }
            }
        }
    }

    super::print_toasts(&registry.notifications, format);
    Ok(())
}
