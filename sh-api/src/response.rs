//! Backend response types.
//!
//! Successful table responses are bare JSON arrays; errors carry a
//! PostgREST error body. Row counts come back in the `Content-Range`
//! header when `Prefer: count=exact` is sent.

use serde::{Deserialize, Serialize};

/// Error body returned by the backend on failed requests:
/// ```json
/// { "code": "42P01", "message": "relation does not exist", "details": null, "hint": null }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl BackendErrorBody {
    /// Parse an error body, falling back to the raw text as the message.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| Self {
            message: (!raw.trim().is_empty()).then(|| raw.trim().to_string()),
            ..Default::default()
        })
    }

    /// One-line description for logs and errors.
    pub fn summary(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match (&self.code, &self.details) {
            (Some(code), Some(details)) => format!("{message} [{code}]: {details}"),
            (Some(code), None) => format!("{message} [{code}]"),
            (None, Some(details)) => format!("{message}: {details}"),
            (None, None) => message.to_string(),
        }
    }
}

/// Parsed `Content-Range` header: `0-24/3573`, `*/0` or `0-24/*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First and last row index of the page, if any rows were returned.
    pub range: Option<(u64, u64)>,
    /// Total matching rows, if the server counted them.
    pub total: Option<u64>,
}

impl ContentRange {
    pub fn parse(header: &str) -> Option<Self> {
        let (range, total) = header.trim().split_once('/')?;
        let range = if range == "*" {
            None
        } else {
            let (start, end) = range.split_once('-')?;
            Some((start.parse().ok()?, end.parse().ok()?))
        };
        let total = if total == "*" { None } else { Some(total.parse().ok()?) };
        Some(Self { range, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_summary() {
        let body = BackendErrorBody::parse(
            r#"{"code":"23505","message":"duplicate key value","details":"Key (id)=(1) already exists.","hint":null}"#,
        );
        assert_eq!(
            body.summary(),
            "duplicate key value [23505]: Key (id)=(1) already exists."
        );
    }

    #[test]
    fn test_error_body_non_json() {
        let body = BackendErrorBody::parse("Bad Gateway");
        assert_eq!(body.summary(), "Bad Gateway");
        assert_eq!(BackendErrorBody::parse("").summary(), "unknown error");
    }

    #[test]
    fn test_content_range() {
        assert_eq!(
            ContentRange::parse("0-24/3573"),
            Some(ContentRange { range: Some((0, 24)), total: Some(3573) })
        );
        assert_eq!(
            ContentRange::parse("*/0"),
            Some(ContentRange { range: None, total: Some(0) })
        );
        assert_eq!(ContentRange::parse("0-9/*").unwrap().total, None);
        assert!(ContentRange::parse("garbage").is_none());
    }
}
