//! Country, city and radius-search endpoints.
//!
//! Distance computation lives in the backend's stored procedures; results
//! arrive sorted by distance and are returned as-is.

use serde_json::json;
use sh_core::constants::{rpc, tables};
use sh_core::error::ShResult;
use sh_models::{City, Country, NearbyCity, NearbyProvider};

use crate::client::ApiClient;
use crate::endpoints::id_arg;
use crate::query::{Order, Query};

impl ApiClient {
    /// All countries, by name.
    pub async fn list_countries(&self) -> ShResult<Vec<Country>> {
        self.select(tables::COUNTRIES, &Query::new().order("name", Order::Asc))
            .await
    }

    /// Cities of one country, by name.
    pub async fn cities_by_country(&self, country_code: &str) -> ShResult<Vec<City>> {
        let query = Query::new()
            .eq("country_code", country_code.trim().to_ascii_uppercase())
            .order("name", Order::Asc);
        self.select(tables::CITIES, &query).await
    }

    /// `cities_within_radius(p_city_id, p_radius_km)`.
    pub async fn cities_within_radius(
        &self,
        city_id: &str,
        radius_km: f64,
    ) -> ShResult<Vec<NearbyCity>> {
        let args = json!({ "p_city_id": id_arg(city_id), "p_radius_km": radius_km });
        self.rpc(rpc::CITIES_WITHIN_RADIUS, &args).await
    }

    /// `providers_within_radius(p_city_id, p_radius_km)`.
    pub async fn providers_within_radius(
        &self,
        city_id: &str,
        radius_km: f64,
    ) -> ShResult<Vec<NearbyProvider>> {
        let args = json!({ "p_city_id": id_arg(city_id), "p_radius_km": radius_km });
        self.rpc(rpc::PROVIDERS_WITHIN_RADIUS, &args).await
    }
}
