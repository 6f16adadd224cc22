//! Provider discovery.
//!
//! A search with a city and a radius goes through the radius stored
//! procedure and the other filters are applied to the returned rows;
//! everything else is a filtered table select.

use serde::Serialize;
use tracing::debug;

use sh_api::endpoints::providers::ProviderQuery;
use sh_api::Backend;
use sh_core::error::ShResult;
use sh_models::{ProviderProfile, ServiceOffering};

use crate::geo::GeoService;
use crate::notification::NotificationCenter;
use crate::service::{impl_service, ServiceState};

/// Search criteria. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct ProviderFilter {
    pub country_code: Option<String>,
    pub city_id: Option<String>,
    pub radius_km: Option<f64>,
    /// Case-insensitive category match.
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub available_only: bool,
    pub limit: Option<u64>,
}

impl ProviderFilter {
    fn matches(&self, provider: &ProviderProfile) -> bool {
        if let Some(code) = &self.country_code {
            if !provider
                .country_code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(code))
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !provider.in_category(category) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if provider.rating_or_zero() < min {
                return false;
            }
        }
        !self.available_only || provider.is_available
    }

    fn table_query(&self) -> ProviderQuery {
        ProviderQuery {
            country_code: self.country_code.clone(),
            city_id: self.city_id.clone(),
            category: self.category.clone(),
            min_rating: self.min_rating,
            available_only: self.available_only,
            limit: self.limit,
        }
    }
}

/// A search hit. `distance_km` is set for radius searches.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderMatch {
    #[serde(flatten)]
    pub provider: ProviderProfile,
    pub distance_km: Option<f64>,
}

pub struct ProviderService {
    state: ServiceState,
    backend: Backend,
    geo: GeoService,
    notifications: NotificationCenter,
}

impl ProviderService {
    pub fn new(backend: Backend, geo: GeoService, notifications: NotificationCenter) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
            geo,
            notifications,
        }
    }

    /// Find providers. Remote failures are reported and yield no results.
    pub async fn search(&self, filter: &ProviderFilter) -> ShResult<Vec<ProviderMatch>> {
        if let (Some(city_id), Some(_)) = (&filter.city_id, filter.radius_km) {
            let nearby = self
                .geo
                .providers_within_radius(city_id, filter.radius_km)
                .await?;
            let total = nearby.len();
            let mut matches: Vec<ProviderMatch> = nearby
                .into_iter()
                .filter(|n| filter.matches(&n.provider))
                .map(|n| ProviderMatch {
                    provider: n.provider,
                    distance_km: Some(n.distance),
                })
                .collect();
            if let Some(limit) = filter.limit {
                matches.truncate(limit as usize);
            }
            debug!("radius search kept {} of {total} providers", matches.len());
            return Ok(matches);
        }

        let api = self.backend.client()?;
        match api.search_providers(&filter.table_query()).await {
            Ok(rows) => Ok(rows
                .into_iter()
                .map(|provider| ProviderMatch {
                    provider,
                    distance_km: None,
                })
                .collect()),
            Err(e) => {
                self.notifications.report_remote_error("Searching providers", &e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn get(&self, provider_id: &str) -> ShResult<ProviderProfile> {
        self.backend.client()?.get_provider(provider_id).await
    }

    /// Active services of a provider.
    pub async fn services(&self, provider_id: &str) -> ShResult<Vec<ServiceOffering>> {
        self.backend.client()?.provider_services(provider_id).await
    }
}

impl_service!(ProviderService, "providers");
