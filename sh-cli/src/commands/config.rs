//! Config commands.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use dialoguer::{Input, Password};

use sh_core::config::{AppConfig, ConfigHandle};
use sh_core::error::{ShError, ShResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (keys masked).
    Show,
    /// Write a configuration file, prompting for missing backend values.
    Init {
        /// Backend URL.
        #[arg(long)]
        url: Option<String>,
        /// Public (anon) API key.
        #[arg(long)]
        anon_key: Option<String>,
        /// Default country code for city lookups.
        #[arg(long)]
        country: Option<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(not set)"
    } else {
        "********"
    }
}

fn config_json(cfg: &AppConfig) -> serde_json::Value {
    let mut json = serde_json::to_value(cfg).unwrap_or_default();
    json["backend"]["anon_key"] = serde_json::json!(mask(&cfg.backend.anon_key));
    json["backend"]["access_token"] = serde_json::json!(mask(&cfg.backend.access_token));
    json
}

fn print_config_text(cfg: &AppConfig, path: &std::path::Path) {
    println!("  File: {}\n", path.display());

    println!("{}", style("Backend").bold().underlined());
    println!("  backend.url                      {}", cfg.backend.url);
    println!("  backend.anon_key                 {}", mask(&cfg.backend.anon_key));
    println!("  backend.access_token             {}", mask(&cfg.backend.access_token));
    println!("  backend.api_timeout_ms           {}", cfg.backend.api_timeout_ms);
    println!("  backend.max_retries              {}", cfg.backend.max_retries);

    println!();
    println!("{}", style("Liveness").bold().underlined());
    println!("  liveness.blink_ratio_threshold   {}", cfg.liveness.blink_ratio_threshold);
    println!("  liveness.required_blinks         {}", cfg.liveness.required_blinks);
    println!("  liveness.yaw_threshold_deg       {}", cfg.liveness.yaw_threshold_deg);
    println!("  liveness.frame_interval_ms       {}", cfg.liveness.frame_interval_ms);
    println!("  liveness.success_countdown_secs  {}", cfg.liveness.success_countdown_secs);
    println!(
        "  liveness.timeout_secs            {}",
        cfg.liveness.timeout_secs.map_or("none".to_string(), |s| s.to_string())
    );

    println!();
    println!("{}", style("Geo").bold().underlined());
    println!("  geo.default_country              {}", cfg.geo.default_country);
    println!("  geo.default_radius_km            {}", cfg.geo.default_radius_km);
    println!("  geo.max_radius_km                {}", cfg.geo.max_radius_km);

    println!();
    println!("{}", style("Wallet").bold().underlined());
    println!("  wallet.currency                  {}", cfg.wallet.currency);
    println!("  wallet.min_withdrawal            {}", cfg.wallet.min_withdrawal);

    println!();
    println!("{}", style("Migration").bold().underlined());
    println!("  migration.snapshot_path          {}", cfg.migration.snapshot_path);
    println!("  migration.page_size              {}", cfg.migration.page_size);
    println!("  migration.batch_size             {}", cfg.migration.batch_size);

    println!();
    println!("{}", style("Logging").bold().underlined());
    println!("  logging.level                    {}", cfg.logging.level);
    println!("  logging.directory                {}", cfg.logging.directory);
    println!("  logging.json_output              {}", cfg.logging.json_output);
}

pub async fn run(
    config: ConfigHandle,
    config_path: PathBuf,
    action: ConfigAction,
    format: OutputFormat,
) -> ShResult<()> {
    match action {
        ConfigAction::Show => {
            let cfg = config.read().await;
            match format {
                OutputFormat::Json => super::print_json(&config_json(&cfg)),
                OutputFormat::Text => print_config_text(&cfg, &config_path),
            }
        }
        ConfigAction::Init { url, anon_key, country, force } => {
            if config_path.exists() && !force {
                return Err(ShError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                )));
            }

            let url = match url {
                Some(u) => u,
                None => Input::new()
                    .with_prompt("Backend URL")
                    .interact_text()
                    .map_err(|e| ShError::Internal(e.to_string()))?,
            };
            let anon_key = match anon_key {
                Some(k) => k,
                None => Password::new()
                    .with_prompt("Anon API key")
                    .interact()
                    .map_err(|e| ShError::Internal(e.to_string()))?,
            };

            {
                let mut cfg = config.write().await;
                cfg.backend.url = AppConfig::sanitize_backend_url(&url);
                cfg.backend.anon_key = anon_key.trim().to_string();
                if let Some(code) = country {
                    cfg.geo.default_country = code.trim().to_ascii_uppercase();
                }
                cfg.validate()?;
                cfg.save_to_file(&config_path)?;
            }

            let cfg = config.read().await;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "path": config_path.display().to_string(),
                    "backend_url": cfg.backend.url,
                })),
                OutputFormat::Text => {
                    println!(
                        "  {} Wrote {} (backend {})",
                        style("OK").green().bold(),
                        config_path.display(),
                        cfg.backend.url
                    );
                }
            }
        }
    }

    Ok(())
}
