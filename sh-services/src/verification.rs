//! Identity verification after a liveness check.
//!
//! A passed check marks the profile as liveness-verified and queues it for
//! manual review. The captured still is not uploaded; only its size is
//! recorded in the logs.

use tracing::info;

use sh_api::endpoints::profiles::VerificationUpdate;
use sh_api::Backend;
use sh_core::error::ShResult;
use sh_models::{Profile, VerificationStatus};

use crate::event_bus::{AppEvent, EventBus};
use crate::liveness::LivenessOutcome;
use crate::notification::NotificationCenter;
use crate::service::{impl_service, ServiceState};

pub struct VerificationService {
    state: ServiceState,
    backend: Backend,
    event_bus: EventBus,
    notifications: NotificationCenter,
}

impl VerificationService {
    pub fn new(backend: Backend, event_bus: EventBus, notifications: NotificationCenter) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
            event_bus,
            notifications,
        }
    }

    /// Apply a liveness outcome to a user's profile.
    ///
    /// Returns the updated profile on success and `None` on failure, in
    /// which case the profile is left untouched.
    pub async fn record_outcome(
        &self,
        user_id: &str,
        outcome: &LivenessOutcome,
    ) -> ShResult<Option<Profile>> {
        if !outcome.success {
            self.notifications.warning(
                "Verification",
                "Liveness check failed. Please try again in good lighting.",
            );
            info!("liveness check failed for {user_id}");
            return Ok(None);
        }

        info!(
            "liveness check passed for {user_id} (still image: {} bytes)",
            outcome.image_len()
        );

        let api = self.backend.client()?;
        let profile = match api
            .update_profile_verification(
                user_id,
                &VerificationUpdate {
                    liveness_verified: true,
                    verification_status: VerificationStatus::Pending,
                },
            )
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                self.notifications.report_remote_error("Saving verification", &e);
                return Err(e);
            }
        };

        self.event_bus.emit(AppEvent::VerificationUpdated {
            user_id: user_id.to_string(),
            liveness_verified: true,
        });
        self.notifications.report_success(
            "Verification",
            "Liveness confirmed. Your identity is now under review.",
        );
        Ok(Some(profile))
    }

    pub async fn status(&self, user_id: &str) -> ShResult<Profile> {
        self.backend.client()?.get_profile(user_id).await
    }
}

impl_service!(VerificationService, "verification");
