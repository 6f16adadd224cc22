//! Service trait and lifecycle states.
//!
//! Every marketplace service implements `Service` so the registry can
//! bring them up in order, report health and tear them down.

use sh_core::error::ShResult;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Created but not initialized.
    Created,
    /// Running and ready.
    Running,
    /// Stopped by shutdown.
    Stopped,
    /// Initialization failed.
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Standard lifecycle and health interface.
///
/// Services are initialized in registration order by the `ServiceRegistry`
/// and shut down in reverse.
pub trait Service: Send + Sync {
    /// Human-readable name of this service.
    fn name(&self) -> &str;

    /// Current state of this service.
    fn state(&self) -> ServiceState;

    /// Initialize the service. Called once during startup.
    fn init(&mut self) -> ShResult<()>;

    /// Shut the service down.
    fn shutdown(&mut self) -> ShResult<()>;

    /// Returns true if the service is operational.
    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}

/// Implements `Service` for a struct with a `state: ServiceState` field.
macro_rules! impl_service {
    ($ty:ty, $name:expr) => {
        impl $crate::service::Service for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn state(&self) -> $crate::service::ServiceState {
                self.state
            }

            fn init(&mut self) -> sh_core::error::ShResult<()> {
                self.state = $crate::service::ServiceState::Running;
                tracing::info!("{} service initialized", $name);
                Ok(())
            }

            fn shutdown(&mut self) -> sh_core::error::ShResult<()> {
                self.state = $crate::service::ServiceState::Stopped;
                tracing::info!("{} service stopped", $name);
                Ok(())
            }
        }
    };
}

pub(crate) use impl_service;
