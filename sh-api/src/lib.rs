//! ServiceHub API - HTTP client for the hosted backend's table/RPC REST API.
//!
//! This crate provides a typed client for a PostgREST-style backend: table
//! selects with filters, inserts, updates, upserts, deletes, and stored
//! procedure calls, plus typed endpoint methods for every marketplace table.
//! Client creation goes through [`Backend::from_config`], which makes an
//! unconfigured or broken backend an explicit variant instead of a stub.

pub mod backend;
pub mod client;
pub mod endpoints;
pub mod query;
pub mod response;

// Re-export key types
pub use backend::Backend;
pub use client::{ApiClient, RetryConfig};
pub use query::{Order, Query};
pub use response::{BackendErrorBody, ContentRange};
