//! ServiceHub CLI - Command-line interface for the ServiceHub marketplace.
//!
//! Exposes every service operation from the terminal: geography lookups,
//! provider search, bookings, messaging, wallet, liveness verification from
//! recorded frame scripts, and backend migration through a local snapshot.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use sh_core::config::{AppConfig, ConfigHandle};
use sh_core::error::ShResult;
use sh_core::logging;
use sh_services::SessionContext;

/// ServiceHub - local services marketplace.
#[derive(Parser)]
#[command(
    name = "servicehub",
    version,
    about = "ServiceHub marketplace CLI",
    long_about = "A command-line interface for the ServiceHub marketplace.\n\
                   Find providers, manage bookings, messages and payouts, and run\n\
                   identity checks against the hosted backend."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Act as this user id (profile id) when a command needs one.
    #[arg(short, long, global = true, env = "SERVICEHUB_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backend reachability, snapshot and service health.
    Status,
    /// Show or create the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Countries, cities and radius lookups.
    Geo {
        #[command(subcommand)]
        action: commands::geo::GeoAction,
    },
    /// Search and inspect service providers.
    Providers {
        #[command(subcommand)]
        action: commands::providers::ProvidersAction,
    },
    /// Create and manage bookings.
    Bookings {
        #[command(subcommand)]
        action: commands::bookings::BookingsAction,
    },
    /// Conversations between clients and providers.
    Messages {
        #[command(subcommand)]
        action: commands::messages::MessagesAction,
    },
    /// Invoices and provider withdrawals.
    Wallet {
        #[command(subcommand)]
        action: commands::wallet::WalletAction,
    },
    /// Identity verification.
    Verify {
        #[command(subcommand)]
        action: commands::verify::VerifyAction,
    },
    /// Copy data between backends through a local snapshot.
    Migrate {
        #[command(subcommand)]
        action: commands::migrate::MigrateAction,
    },
}

#[tokio::main]
async fn main() -> ShResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match cli.config.as_deref() {
        Some(path) => std::path::PathBuf::from(path),
        None => AppConfig::default_config_path()
            .unwrap_or_else(|_| std::path::PathBuf::from("config.toml")),
    };
    let config = if config_path.exists() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    // Initialize logging
    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));
    let _guard = logging::init_from_config(&config.logging, &log_dir, cli.verbose)?;

    info!("ServiceHub CLI v{}", sh_core::constants::APP_VERSION);

    let config_handle = ConfigHandle::new(config);
    let session = match cli.user {
        Some(user) => SessionContext::with_user(user),
        None => SessionContext::new(),
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Status => {
            commands::status::run(config_handle, config_path, cli.format).await
        }
        Commands::Config { action } => {
            commands::config::run(config_handle, config_path, action, cli.format).await
        }
        Commands::Geo { action } => {
            commands::geo::run(config_handle, action, cli.format).await
        }
        Commands::Providers { action } => {
            commands::providers::run(config_handle, action, cli.format).await
        }
        Commands::Bookings { action } => {
            commands::bookings::run(config_handle, session, action, cli.format).await
        }
        Commands::Messages { action } => {
            commands::messages::run(config_handle, session, action, cli.format).await
        }
        Commands::Wallet { action } => {
            commands::wallet::run(config_handle, session, action, cli.format).await
        }
        Commands::Verify { action } => {
            commands::verify::run(config_handle, session, action, cli.format).await
        }
        Commands::Migrate { action } => {
            commands::migrate::run(config_handle, action, cli.format).await
        }
    }
}
