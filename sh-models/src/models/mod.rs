//! Remote row model definitions.

pub mod profile;
pub mod provider;
pub mod conversation;
pub mod booking;
pub mod wallet;
pub mod geo;
