//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output goes to stderr; a daily-rotated file under the log
//! directory receives the same events, optionally as JSON lines.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling;

use crate::config::LoggingConfig;
use crate::error::{ShError, ShResult};

/// Log file name prefix inside the log directory.
const LOG_FILE_PREFIX: &str = "servicehub.log";

/// Initialize the global tracing subscriber.
///
/// * `level` - filter directive ("info", "debug", "sh_services=trace", ...)
/// * `log_dir` - directory for the rotated log files
/// * `json_output` - write the file output as JSON lines
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> ShResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    // Exactly one of the two file layers is active.
    let json_layer = json_output.then(|| {
        fmt::layer()
            .with_writer(writer.clone())
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });
    let text_layer = (!json_output).then(|| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(console_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| ShError::Config(format!("logging already initialized: {e}")))?;

    tracing::info!("logging initialized at level={level}, dir={}", log_dir.display());

    Ok(LogGuard { _guard: guard })
}

/// Initialize logging from the `[logging]` config section.
///
/// A `verbose` flag forces the debug level regardless of the configured one.
pub fn init_from_config(config: &LoggingConfig, log_dir: &Path, verbose: bool) -> ShResult<LogGuard> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    init_logging(level, log_dir, config.json_output)
}

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize a minimal console-only logger for tests and one-shot commands.
/// Later calls are no-ops.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).compact())
        .try_init();
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
