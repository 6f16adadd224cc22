//! Provider profile (`provider_profiles`) and service offering (`services`) rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_ext;

/// Public business profile of a provider account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    /// Owning `profiles.id`.
    #[serde(deserialize_with = "serde_ext::id")]
    pub user_id: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "serde_ext::opt_id")]
    pub city_id: Option<String>,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub hourly_rate: Option<f64>,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: i64,
    #[serde(default = "default_available")]
    pub is_available: bool,
    /// Earnings not yet withdrawn, in whole currency units.
    #[serde(default, deserialize_with = "serde_ext::amount")]
    pub balance: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_available() -> bool {
    true
}

impl ProviderProfile {
    /// Rating used for sorting; unrated providers sort last.
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// Case-insensitive category match.
    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category.trim()))
    }
}

/// A priced service a provider offers (`services` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOffering {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub provider_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "serde_ext::amount")]
    pub price: i64,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default = "default_available")]
    pub is_active: bool,
}
