//! Country and city rows, plus the radius-search result shapes.

use serde::{Deserialize, Serialize};

use crate::serde_ext;

/// A country (`countries` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
}

/// A city (`cities` table). Only `{id, name}` are guaranteed by the
/// lookup contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// A city returned by the radius stored procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyCity {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    pub name: String,
    /// Kilometers from the origin city, computed server-side.
    #[serde(deserialize_with = "distance")]
    pub distance: f64,
}

/// A provider returned by the radius stored procedure.
///
/// Carries the provider row's columns plus `distance`; unknown extra
/// columns are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyProvider {
    #[serde(flatten)]
    pub provider: super::provider::ProviderProfile,
    #[serde(deserialize_with = "distance")]
    pub distance: f64,
}

fn distance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_ext::lenient_f64(deserializer)
        .map(|d| d.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_city_quoted_distance() {
        let city: NearbyCity =
            serde_json::from_str(r#"{"id": 12, "name": "Abomey-Calavi", "distance": "14.2"}"#).unwrap();
        assert_eq!(city.id, "12");
        assert!((city.distance - 14.2).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_provider_flattened() {
        let nearby: NearbyProvider = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "user_id": "u-1",
            "business_name": "Coiffure Grâce",
            "distance": 3.5
        }))
        .unwrap();
        assert_eq!(nearby.provider.business_name, "Coiffure Grâce");
        assert_eq!(nearby.distance, 3.5);
    }
}
