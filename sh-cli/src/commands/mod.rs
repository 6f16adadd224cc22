//! CLI command implementations.

pub mod status;
pub mod config;
pub mod geo;
pub mod providers;
pub mod bookings;
pub mod messages;
pub mod wallet;
pub mod verify;
pub mod migrate;

use chrono::{DateTime, NaiveDateTime, Utc};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_services::notification::{NotificationCenter, ToastLevel};
use sh_services::{ServiceRegistry, SessionContext};

use crate::OutputFormat;

/// Helper to build the service registry from config.
pub async fn init_registry(config: &ConfigHandle, session: SessionContext) -> ServiceRegistry {
    ServiceRegistry::from_config(config.clone(), session).await
}

/// Print toasts raised while a command ran. Warnings and errors go to
/// stderr, as does everything in JSON mode.
pub fn print_toasts(notifications: &NotificationCenter, format: OutputFormat) {
    for toast in notifications.drain() {
        let label = match toast.level {
            ToastLevel::Info => style("INFO").cyan().bold(),
            ToastLevel::Success => style("OK").green().bold(),
            ToastLevel::Warning => style("WARN").yellow().bold(),
            ToastLevel::Error => style("ERROR").red().bold(),
        };
        let to_stderr = matches!(format, OutputFormat::Json)
            || matches!(toast.level, ToastLevel::Warning | ToastLevel::Error);
        if to_stderr {
            eprintln!("  {label} {}: {}", toast.title, toast.message);
        } else {
            println!("  {label} {}: {}", toast.title, toast.message);
        }
    }
}

/// Print a JSON value the way every command does.
pub fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// A table with the CLI's standard look.
pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Parse a date/time argument: RFC 3339, or `YYYY-MM-DD HH:MM` taken as UTC.
pub fn parse_datetime(value: &str) -> ShResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            ShError::InvalidInput(format!(
                "invalid date '{value}', expected RFC 3339 or 'YYYY-MM-DD HH:MM'"
            ))
        })
}

/// Format a date/time for tables.
pub fn format_datetime(dt: Option<&DateTime<Utc>>) -> String {
    dt.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
}

/// Whole-unit amount with thin grouping, e.g. `15 000 XOF`.
pub fn format_amount(amount: i64, currency: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} {currency}")
}

/// Truncate a string to a maximum length, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Sénégal", 10), "Sénégal");
        assert_eq!(truncate("Côte d'Ivoire", 8), "Côte ...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(15_000, "XOF"), "15 000 XOF");
        assert_eq!(format_amount(999, "XOF"), "999 XOF");
        assert_eq!(format_amount(-1_234_567, "XOF"), "-1 234 567 XOF");
    }

    #[test]
    fn test_parse_datetime_formats() {
        let a = parse_datetime("2030-03-01T09:00:00Z").unwrap();
        let b = parse_datetime("2030-03-01 09:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("tomorrow").is_err());
    }
}
