//! Provider profile and service offering endpoints.

use sh_core::constants::tables;
use sh_core::error::{ShError, ShResult};
use sh_models::{ProviderProfile, ServiceOffering};

use crate::client::ApiClient;
use crate::query::{Order, Query};

/// Table-side provider filters. Every field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct ProviderQuery {
    pub country_code: Option<String>,
    pub city_id: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub available_only: bool,
    pub limit: Option<u64>,
}

impl ProviderQuery {
    fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(code) = &self.country_code {
            query = query.eq("country_code", code.to_ascii_uppercase());
        }
        if let Some(city) = &self.city_id {
            query = query.eq("city_id", city);
        }
        if let Some(category) = &self.category {
            query = query.ilike("category", category);
        }
        if let Some(rating) = self.min_rating {
            query = query.gte("rating", rating);
        }
        if self.available_only {
            query = query.eq("is_available", true);
        }
        query = query
            .order("rating", Order::Desc)
            .order("business_name", Order::Asc);
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

impl ApiClient {
    /// Search provider profiles, best rated first.
    pub async fn search_providers(&self, filter: &ProviderQuery) -> ShResult<Vec<ProviderProfile>> {
        self.select(tables::PROVIDER_PROFILES, &filter.to_query()).await
    }

    /// Get a provider profile by id.
    pub async fn get_provider(&self, id: &str) -> ShResult<ProviderProfile> {
        self.select_one(tables::PROVIDER_PROFILES, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ShError::not_found(tables::PROVIDER_PROFILES, id))
    }

    /// Active services offered by a provider, by title.
    pub async fn provider_services(&self, provider_id: &str) -> ShResult<Vec<ServiceOffering>> {
        let query = Query::new()
            .eq("provider_id", provider_id)
            .eq("is_active", true)
            .order("title", Order::Asc);
        self.select(tables::SERVICES, &query).await
    }

    /// Get a service offering by id.
    pub async fn get_service(&self, id: &str) -> ShResult<ServiceOffering> {
        self.select_one(tables::SERVICES, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ShError::not_found(tables::SERVICES, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_query_params() {
        let params = ProviderQuery {
            country_code: Some("bj".into()),
            category: Some("plumb*".into()),
            min_rating: Some(4.5),
            available_only: true,
            limit: Some(10),
            ..Default::default()
        }
        .to_query()
        .read_params();

        assert!(params.contains(&("country_code".into(), "eq.BJ".into())));
        assert!(params.contains(&("category".into(), "ilike.plumb*".into())));
        assert!(params.contains(&("rating".into(), "gte.4.5".into())));
        assert!(params.contains(&("is_available".into(), "eq.true".into())));
        assert!(params.contains(&("order".into(), "rating.desc,business_name.asc".into())));
        assert!(params.contains(&("limit".into(), "10".into())));
    }

    #[test]
    fn test_empty_provider_query() {
        let params = ProviderQuery::default().to_query().read_params();
        assert_eq!(params.len(), 2);
    }
}
