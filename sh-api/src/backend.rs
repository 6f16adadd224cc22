//! Backend client factory.
//!
//! A missing or malformed backend configuration is a normal state (fresh
//! installs, offline tooling), so it is represented as a value rather than
//! a placeholder client. Callers that need the backend ask for it through
//! [`Backend::client`] and get a `BackendUnavailable` error otherwise.

use sh_core::config::BackendConfig;
use sh_core::error::{ShError, ShResult};
use tracing::warn;

use crate::client::ApiClient;

/// Availability of the hosted backend.
#[derive(Clone)]
pub enum Backend {
    Available(ApiClient),
    Unavailable { reason: String },
}

impl Backend {
    /// Build a client from configuration, capturing why it failed if it did.
    pub fn from_config(config: &BackendConfig) -> Self {
        match ApiClient::new(config) {
            Ok(client) => Backend::Available(client),
            Err(e) => {
                warn!("backend unavailable: {e}");
                Backend::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Backend::Available(_))
    }

    /// The client, or `BackendUnavailable` with the recorded reason.
    pub fn client(&self) -> ShResult<&ApiClient> {
        match self {
            Backend::Available(client) => Ok(client),
            Backend::Unavailable { reason } => Err(ShError::BackendUnavailable(reason.clone())),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Available(client) => f
                .debug_tuple("Available")
                .field(&client.origin())
                .finish(),
            Backend::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_is_unavailable() {
        let backend = Backend::from_config(&BackendConfig::default());
        assert!(!backend.is_available());
        let err = backend.client().err().unwrap();
        assert!(matches!(err, ShError::BackendUnavailable(_)));
    }

    #[test]
    fn test_configured_is_available() {
        let backend = Backend::from_config(&BackendConfig {
            url: "localhost:54321".into(),
            anon_key: "k".into(),
            ..Default::default()
        });
        assert!(backend.is_available());
        assert_eq!(backend.client().unwrap().origin(), "http://localhost:54321");
    }
}
