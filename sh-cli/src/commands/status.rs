//! Status command - backend reachability, snapshot and service health.

use std::path::PathBuf;

use console::style;
use sh_core::config::ConfigHandle;
use sh_core::error::ShResult;
use sh_models::SnapshotDb;
use sh_services::SessionContext;

use crate::OutputFormat;

/// Run the status command.
pub async fn run(config: ConfigHandle, config_path: PathBuf, format: OutputFormat) -> ShResult<()> {
    let mut registry = super::init_registry(&config, SessionContext::new()).await;
    registry.register_all();
    registry.init_all().await?;

    let backend_url = config.read().await.backend.url.clone();
    let ping = if registry.backend.is_available() {
        Some(registry.ping_backend().await)
    } else {
        None
    };

    let snapshot_path = config.read().await.effective_snapshot_path()?;
    let latest_export = if snapshot_path.exists() {
        let migration = config.read().await.migration.clone();
        SnapshotDb::open(&snapshot_path, &migration)
            .and_then(|db| db.latest_export())
            .ok()
            .flatten()
    } else {
        None
    };

    let health = registry.health_check().await;
    registry.shutdown_all().await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "config_path": config_path.display().to_string(),
                "backend_url": backend_url,
                "backend_configured": registry.backend.is_available(),
                "backend_reachable": matches!(ping, Some(Ok(_))),
                "latency_ms": ping.as_ref().and_then(|p| p.as_ref().ok()).map(|d| d.as_millis() as u64),
                "backend_error": ping.as_ref().and_then(|p| p.as_ref().err()).map(|e| e.to_string()),
                "snapshot": {
                    "path": snapshot_path.display().to_string(),
                    "exists": snapshot_path.exists(),
                    "last_export": latest_export.as_ref().map(|run| serde_json::json!({
                        "source_url": run.source_url,
                        "host": run.host,
                        "started_at": run.started_at,
                        "finished_at": run.finished_at,
                    })),
                },
                "services": health.iter().map(|(name, state, healthy)| serde_json::json!({
                    "name": name,
                    "state": state.to_string(),
                    "healthy": healthy,
                })).collect::<Vec<_>>(),
            });
            super::print_json(&json);
        }
        OutputFormat::Text => {
            println!("{}", style("Backend").bold().underlined());
            println!("  Config:    {}", config_path.display());
            println!(
                "  URL:       {}",
                if backend_url.is_empty() { "(not set)" } else { backend_url.as_str() }
            );
            let status = match &ping {
                None => style("not configured").yellow().to_string(),
                Some(Ok(latency)) => {
                    format!("{} ({}ms)", style("reachable").green(), latency.as_millis())
                }
                Some(Err(e)) => format!("{} ({e})", style("unreachable").red()),
            };
            println!("  Status:    {status}");

            println!();
            println!("{}", style("Snapshot").bold().underlined());
            println!("  Path:      {}", snapshot_path.display());
            match &latest_export {
                Some(run) => {
                    println!("  Source:    {}", run.source_url);
                    println!(
                        "  Exported:  {} on {}",
                        run.finished_at.as_deref().unwrap_or("(unfinished)"),
                        run.host
                    );
                }
                None => println!("  Exported:  never"),
            }

            println!();
            println!("{}", style("Services").bold().underlined());
            for (name, state, healthy) in &health {
                let mark = if *healthy {
                    style("ok").green().to_string()
                } else {
                    style("down").red().to_string()
                };
                println!("  {name:<14} {mark} ({state})");
            }
        }
    }

    Ok(())
}
