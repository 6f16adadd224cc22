//! Geographic lookups: countries, cities and radius searches.
//!
//! City lists fall back to the bundled per-country tables when the backend
//! has no rows (or cannot be reached), so location pickers always have
//! something to offer. Radius searches are delegated to stored procedures
//! and degrade to an empty list on failure.

use tracing::{debug, warn};

use sh_api::Backend;
use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::fallback;
use sh_models::{City, Country, NearbyCity, NearbyProvider};

use crate::notification::NotificationCenter;
use crate::service::{impl_service, ServiceState};

pub struct GeoService {
    state: ServiceState,
    config: ConfigHandle,
    backend: Backend,
    notifications: NotificationCenter,
}

impl GeoService {
    pub fn new(config: ConfigHandle, backend: Backend, notifications: NotificationCenter) -> Self {
        Self {
            state: ServiceState::Created,
            config,
            backend,
            notifications,
        }
    }

    /// Countries from the backend, or the bundled list when it has none.
    pub async fn countries(&self) -> Vec<Country> {
        let remote = match self.backend.client() {
            Ok(api) => api.list_countries().await,
            Err(e) => Err(e),
        };
        match remote {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => fallback::countries(),
            Err(e) => {
                self.notifications.report_remote_error("Loading countries", &e);
                fallback::countries()
            }
        }
    }

    /// Cities of a country, by name. Empty remote results use the bundled
    /// table for the ISO code; unknown codes give an empty list.
    pub async fn cities_for_country(&self, country_code: &str) -> Vec<City> {
        let code = country_code.trim();
        if code.is_empty() {
            return Vec::new();
        }

        let remote = match self.backend.client() {
            Ok(api) => api.cities_by_country(code).await,
            Err(e) => Err(e),
        };
        match remote {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                debug!("no remote cities for {code}, using bundled table");
                fallback::cities_for(code)
            }
            Err(e) => {
                self.notifications.report_remote_error("Loading cities", &e);
                fallback::cities_for(code)
            }
        }
    }

    /// City pre-selected for a country (its economic capital).
    pub fn default_city(&self, country_code: &str) -> Option<City> {
        fallback::default_city(country_code)
    }

    /// Configured default country code.
    pub async fn default_country(&self) -> String {
        self.config.read().await.geo.default_country.clone()
    }

    /// Resolve an optional radius against configuration limits.
    pub async fn resolve_radius(&self, radius_km: Option<f64>) -> ShResult<f64> {
        let geo = self.config.read().await.geo.clone();
        let radius = radius_km.unwrap_or(geo.default_radius_km);
        if !radius.is_finite() || radius <= 0.0 || radius > geo.max_radius_km {
            return Err(ShError::InvalidInput(format!(
                "radius must be greater than 0 and at most {} km, got {radius}",
                geo.max_radius_km
            )));
        }
        Ok(radius)
    }

    /// Cities within `radius_km` of a city, nearest first.
    pub async fn cities_within_radius(
        &self,
        city_id: &str,
        radius_km: Option<f64>,
    ) -> ShResult<Vec<NearbyCity>> {
        let radius = self.resolve_radius(radius_km).await?;
        let remote = match self.backend.client() {
            Ok(api) => api.cities_within_radius(city_id, radius).await,
            Err(e) => Err(e),
        };
        Ok(remote.unwrap_or_else(|e| {
            warn!("cities_within_radius({city_id}, {radius}) failed: {e}");
            self.notifications.report_remote_error("Nearby cities", &e);
            Vec::new()
        }))
    }

    /// Providers within `radius_km` of a city, nearest first.
    pub async fn providers_within_radius(
        &self,
        city_id: &str,
        radius_km: Option<f64>,
    ) -> ShResult<Vec<NearbyProvider>> {
        let radius = self.resolve_radius(radius_km).await?;
        let remote = match self.backend.client() {
            Ok(api) => api.providers_within_radius(city_id, radius).await,
            Err(e) => Err(e),
        };
        Ok(remote.unwrap_or_else(|e| {
            warn!("providers_within_radius({city_id}, {radius}) failed: {e}");
            self.notifications.report_remote_error("Nearby providers", &e);
            Vec::new()
        }))
    }
}

impl_service!(GeoService, "geo");
