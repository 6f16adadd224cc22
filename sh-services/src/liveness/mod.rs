//! Liveness check: blink, turn left, turn right, then capture a still.
//!
//! - `geometry`: landmark math (eye ratio, yaw)
//! - `session`: the pure step machine
//! - `capture`: camera/detector traits and the capture loop
//! - `scripted`: recorded-frame camera and detector

pub mod capture;
pub mod geometry;
pub mod scripted;
pub mod session;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};

use crate::event_bus::EventBus;
use crate::notification::NotificationCenter;
use crate::service::{impl_service, ServiceState};

pub use capture::{
    Camera, CameraGuard, CaptureLoop, Detection, FaceDetector, Frame, FrameScheduler,
    IntervalScheduler, LivenessControl, LivenessOutcome, LivenessReport, RunEnd, Tick, VideoStream,
};
pub use geometry::{FaceLandmarks, Point};
pub use session::{LivenessSession, LivenessStep, Measurement, StepChange, Thresholds};

/// Runs liveness checks with the configured thresholds. One check at a time.
pub struct LivenessService {
    state: ServiceState,
    config: ConfigHandle,
    event_bus: EventBus,
    notifications: NotificationCenter,
    active: Arc<AtomicBool>,
}

/// Clears the active flag when a check ends, however it ends.
struct ActiveCheck(Arc<AtomicBool>);

impl Drop for ActiveCheck {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LivenessService {
    pub fn new(
        config: ConfigHandle,
        event_bus: EventBus,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            state: ServiceState::Created,
            config,
            event_bus,
            notifications,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Scheduler ticking at the configured frame interval.
    pub async fn interval_scheduler(&self) -> IntervalScheduler {
        let ms = self.config.read().await.liveness.frame_interval_ms;
        IntervalScheduler::new(Duration::from_millis(ms))
    }

    /// Run one check to completion. Returns `SessionActive` if another
    /// check is still running.
    pub async fn run_check<F>(
        &self,
        camera: &dyn Camera,
        detector: &dyn FaceDetector,
        scheduler: &mut dyn FrameScheduler,
        control: &LivenessControl,
        on_complete: F,
    ) -> ShResult<LivenessReport>
    where
        F: FnOnce(LivenessOutcome) + Send + 'static,
    {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ShError::SessionActive);
        }
        let _active = ActiveCheck(self.active.clone());

        let liveness = self.config.read().await.liveness.clone();
        let session = LivenessSession::new(Thresholds::from(&liveness));

        CaptureLoop::new(session, self.event_bus.clone(), self.notifications.clone())
            .with_countdown(liveness.success_countdown_secs)
            .with_timeout(liveness.timeout_secs.map(Duration::from_secs))
            .run(camera, detector, scheduler, control, on_complete)
            .await
    }
}

impl_service!(LivenessService, "liveness");
