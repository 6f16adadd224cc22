//! Service registry for dependency injection and lifecycle management.
//!
//! The registry owns the shared infrastructure (config, backend, event bus,
//! toasts, session), hands out services wired to it, and keeps one
//! instance of each for ordered init/shutdown and health reporting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

use sh_api::{ApiClient, Backend};
use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};

use crate::booking::BookingService;
use crate::event_bus::EventBus;
use crate::geo::GeoService;
use crate::liveness::LivenessService;
use crate::messaging::MessagingService;
use crate::migration::MigrationService;
use crate::notification::NotificationCenter;
use crate::provider::ProviderService;
use crate::service::{Service, ServiceState};
use crate::session::SessionContext;
use crate::verification::VerificationService;
use crate::wallet::WalletService;

/// Central registry of the marketplace services.
pub struct ServiceRegistry {
    /// Application configuration.
    pub config: ConfigHandle,
    /// Remote backend, or the reason it is not configured.
    pub backend: Backend,
    /// Application-level event bus.
    pub event_bus: EventBus,
    /// User-visible toasts.
    pub notifications: NotificationCenter,
    /// Signed-in user.
    pub session: SessionContext,
    services: Vec<(String, Arc<RwLock<Box<dyn Service>>>)>,
}

impl ServiceRegistry {
    pub fn new(config: ConfigHandle, backend: Backend, session: SessionContext) -> Self {
        let event_bus = EventBus::new(256);
        let notifications = NotificationCenter::new(event_bus.clone());
        Self {
            config,
            backend,
            event_bus,
            notifications,
            session,
            services: Vec::new(),
        }
    }

    /// Build a registry from the current configuration.
    pub async fn from_config(config: ConfigHandle, session: SessionContext) -> Self {
        let backend = Backend::from_config(&config.read().await.backend);
        Self::new(config, backend, session)
    }

    /// Register a service. Services are initialized in registration order.
    pub fn register<S: Service + 'static>(&mut self, service: S) {
        let name = service.name().to_string();
        info!("registered service: {name}");
        self.services
            .push((name, Arc::new(RwLock::new(Box::new(service)))));
    }

    /// Register one instance of every service, dependencies first.
    pub fn register_all(&mut self) {
        self.register(self.geo());
        self.register(self.providers());
        self.register(self.liveness());
        self.register(self.verification());
        self.register(self.messaging());
        self.register(self.bookings());
        self.register(self.wallet());
        self.register(self.migration());

        info!("registered {} default services", self.services.len());
    }

    pub fn geo(&self) -> GeoService {
        GeoService::new(
            self.config.clone(),
            self.backend.clone(),
            self.notifications.clone(),
        )
    }

    pub fn providers(&self) -> ProviderService {
        ProviderService::new(self.backend.clone(), self.geo(), self.notifications.clone())
    }

    pub fn liveness(&self) -> LivenessService {
        LivenessService::new(
            self.config.clone(),
            self.event_bus.clone(),
            self.notifications.clone(),
        )
    }

    pub fn verification(&self) -> VerificationService {
        VerificationService::new(
            self.backend.clone(),
            self.event_bus.clone(),
            self.notifications.clone(),
        )
    }

    pub fn messaging(&self) -> MessagingService {
        MessagingService::new(self.backend.clone(), self.event_bus.clone())
    }

    pub fn bookings(&self) -> BookingService {
        BookingService::new(self.config.clone(), self.backend.clone(), self.event_bus.clone())
    }

    pub fn wallet(&self) -> WalletService {
        WalletService::new(self.config.clone(), self.backend.clone(), self.event_bus.clone())
    }

    pub fn migration(&self) -> MigrationService {
        MigrationService::new(self.config.clone(), self.event_bus.clone())
    }

    /// Initialize all registered services in order.
    pub async fn init_all(&self) -> ShResult<()> {
        info!("initializing {} services", self.services.len());

        for (name, service) in &self.services {
            let mut svc = service.write().await;
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(ShError::ServiceInit(format!("{name}: {e}")));
            }
        }

        info!("all services initialized");
        Ok(())
    }

    /// Shut down all services in reverse order.
    pub async fn shutdown_all(&self) -> ShResult<()> {
        info!("shutting down services");

        for (name, service) in self.services.iter().rev() {
            let mut svc = service.write().await;
            if let Err(e) = svc.shutdown() {
                // keep going, the rest still need to stop
                error!("error shutting down service {name}: {e}");
            }
        }

        info!("all services shut down");
        Ok(())
    }

    /// The configured API client.
    pub fn api_client(&self) -> ShResult<ApiClient> {
        self.backend.client().cloned()
    }

    /// Round-trip time to the backend.
    pub async fn ping_backend(&self) -> ShResult<Duration> {
        self.backend.client()?.health_check().await
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// State and health of each registered service.
    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut results = Vec::new();
        for (name, service) in &self.services {
            let svc = service.read().await;
            results.push((name.clone(), svc.state(), svc.is_healthy()));
        }
        results
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
