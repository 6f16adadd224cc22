//! Profile endpoints.

use serde::Serialize;
use sh_core::constants::tables;
use sh_core::error::{ShError, ShResult};
use sh_models::{Profile, VerificationStatus};

use crate::client::ApiClient;
use crate::query::Query;

/// Columns changed after a liveness check.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationUpdate {
    pub liveness_verified: bool,
    pub verification_status: VerificationStatus,
}

impl ApiClient {
    /// Get a profile by user id.
    pub async fn get_profile(&self, id: &str) -> ShResult<Profile> {
        self.select_one(tables::PROFILES, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ShError::not_found(tables::PROFILES, id))
    }

    /// Record the result of a liveness check on a profile.
    pub async fn update_profile_verification(
        &self,
        id: &str,
        update: &VerificationUpdate,
    ) -> ShResult<Profile> {
        let rows: Vec<Profile> = self
            .update(tables::PROFILES, &Query::new().eq("id", id), update)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ShError::not_found(tables::PROFILES, id))
    }
}
