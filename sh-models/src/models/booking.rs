//! Booking row (`bookings` table) and its status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_ext;

/// Lifecycle of a booking.
///
/// ```text
/// pending ──► confirmed ──► in_progress ──► completed
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the wire value (also accepts `-` for `_`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a booking may move from `self` to `next`.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client's reservation of a provider's service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub client_id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub provider_id: String,
    #[serde(default, deserialize_with = "serde_ext::opt_id")]
    pub service_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "serde_ext::amount")]
    pub price: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    const ALL: [BookingStatus; 5] = [Pending, Confirmed, InProgress, Completed, Cancelled];

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [Completed, Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_forward_path() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(BookingStatus::parse("in-progress"), Some(InProgress));
        assert_eq!(BookingStatus::parse("Canceled"), Some(Cancelled));
        assert_eq!(BookingStatus::parse("unknown"), None);
        for s in ALL {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_booking_wire_format() {
        let booking: Booking = serde_json::from_value(serde_json::json!({
            "id": 1,
            "client_id": "c",
            "provider_id": "p",
            "scheduled_at": "2030-01-01T09:00:00Z",
            "status": "in_progress",
            "price": 20000
        }))
        .unwrap();
        assert_eq!(booking.status, InProgress);
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["status"], "in_progress");
    }
}
