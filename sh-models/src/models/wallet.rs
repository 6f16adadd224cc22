//! Invoice (`invoices`) and withdrawal (`withdrawals`) rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_ext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Issued,
    Paid,
    Void,
}

/// Invoice issued to the client when a booking completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub booking_id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub client_id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub provider_id: String,
    #[serde(deserialize_with = "serde_ext::amount")]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

/// Withdrawal request lifecycle.
///
/// `pending` → `approved` | `rejected`; `approved` → `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Paid)
        )
    }

    /// Pending and approved requests still reserve part of the balance.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider's request to pay out part of their balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub provider_id: String,
    #[serde(deserialize_with = "serde_ext::amount")]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Payout channel, e.g. "mobile_money" or "bank_transfer".
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub account_reference: Option<String>,
    #[serde(default)]
    pub status: WithdrawalStatus,
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "XOF".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use WithdrawalStatus::*;

    #[test]
    fn test_withdrawal_transitions() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Paid.can_transition_to(Pending));
    }

    #[test]
    fn test_outstanding() {
        assert!(Pending.is_outstanding());
        assert!(Approved.is_outstanding());
        assert!(!Rejected.is_outstanding());
        assert!(!Paid.is_outstanding());
    }

    #[test]
    fn test_invoice_default_currency() {
        let invoice: Invoice = serde_json::from_value(serde_json::json!({
            "id": "i-1", "booking_id": "b-1", "client_id": "c", "provider_id": "p", "amount": 15000
        }))
        .unwrap();
        assert_eq!(invoice.currency, "XOF");
        assert_eq!(invoice.status, InvoiceStatus::Issued);
    }
}
