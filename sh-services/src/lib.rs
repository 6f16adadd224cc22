//! ServiceHub Services - Business logic and service layer.
//!
//! This crate provides the service trait, the service registry and the
//! marketplace services:
//! - Liveness check (blink, head turns, still capture)
//! - Identity verification from liveness outcomes
//! - Geography (countries, cities, radius search with offline fallback)
//! - Provider search
//! - Bookings and invoicing
//! - Client/provider messaging
//! - Wallet (invoices, withdrawals)
//! - Backend migration through a local snapshot
//! - Toast notifications and the event bus

pub mod service;
pub mod registry;
pub mod event_bus;
pub mod notification;
pub mod session;
pub mod liveness;
pub mod verification;
pub mod geo;
pub mod provider;
pub mod booking;
pub mod messaging;
pub mod wallet;
pub mod migration;

// Re-export key types
pub use service::{Service, ServiceState};
pub use registry::ServiceRegistry;
pub use event_bus::{AppEvent, EventBus};
pub use notification::{NotificationCenter, Toast, ToastLevel};
pub use session::SessionContext;
pub use liveness::{LivenessOutcome, LivenessService, LivenessStep};
pub use verification::VerificationService;
pub use geo::GeoService;
pub use provider::{ProviderFilter, ProviderMatch, ProviderService};
pub use booking::{BookingRequest, BookingService};
pub use messaging::MessagingService;
pub use wallet::{WalletService, WithdrawalRequest};
pub use migration::{MigrationProgress, MigrationService, MigrationSummary};
