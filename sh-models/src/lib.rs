//! ServiceHub Models - Remote row types, static geo data, and the local snapshot store.
//!
//! Rows of the hosted backend (profiles, providers, services, conversations,
//! messages, bookings, invoices, withdrawals, countries, cities) are modelled
//! as plain serde structs; the backend schema owns their shape. The crate
//! also carries the static fallback city tables and the SQLite snapshot
//! database used by the migration tooling.

pub mod serde_ext;
pub mod models;
pub mod fallback;
pub mod db;
pub mod schema;
pub mod migrations;
pub mod snapshot;

// Re-export key types
pub use db::{SnapshotDb, DbPool};
pub use models::profile::{Profile, UserRole, VerificationStatus};
pub use models::provider::{ProviderProfile, ServiceOffering};
pub use models::conversation::{Conversation, Message};
pub use models::booking::{Booking, BookingStatus};
pub use models::wallet::{Invoice, InvoiceStatus, Withdrawal, WithdrawalStatus};
pub use models::geo::{City, Country, NearbyCity, NearbyProvider};
