//! User profile row (`profiles` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_ext;

/// Role of a marketplace account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Client,
    Provider,
    Admin,
}

/// Identity verification state of a profile.
///
/// `Pending` is set once the liveness check passed; staff move it to
/// `Verified` or `Rejected` after document review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marketplace account, client or provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "serde_ext::opt_id")]
    pub city_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub liveness_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Name shown in lists, falling back to the email then the id.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
            .to_string()
    }

    pub fn is_provider(&self) -> bool {
        self.role == UserRole::Provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_json() {
        let json = serde_json::json!({
            "id": "0b7c-uuid",
            "full_name": "Afi Dossou",
            "role": "provider",
            "country_code": "BJ",
            "city_id": 3,
            "verification_status": "pending",
            "created_at": "2024-05-01T10:00:00Z",
            "some_new_column": true
        });
        let profile: Profile = serde_json::from_value(json).unwrap();
        assert!(profile.is_provider());
        assert_eq!(profile.city_id.as_deref(), Some("3"));
        assert_eq!(profile.verification_status, VerificationStatus::Pending);
        assert!(!profile.liveness_verified);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut profile: Profile = serde_json::from_value(serde_json::json!({"id": "u1"})).unwrap();
        assert_eq!(profile.display_name(), "u1");
        profile.email = Some("a@b.bj".into());
        assert_eq!(profile.display_name(), "a@b.bj");
        profile.full_name = Some("  ".into());
        assert_eq!(profile.display_name(), "a@b.bj");
        profile.full_name = Some("Koffi".into());
        assert_eq!(profile.display_name(), "Koffi");
        assert_eq!(profile.role, UserRole::Client);
    }
}
