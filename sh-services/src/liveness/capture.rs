//! Camera capture loop driving a [`LivenessSession`].
//!
//! The camera, face detector and frame cadence sit behind traits so the
//! loop runs the same way against real devices and recorded scripts.
//! The stream is held by a [`CameraGuard`] that stops every track when it
//! goes out of scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use sh_core::error::{ShError, ShResult};

use super::geometry::FaceLandmarks;
use super::session::{LivenessSession, LivenessStep, Measurement, StepChange};
use crate::event_bus::{AppEvent, EventBus};
use crate::notification::NotificationCenter;

/// One video frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Position in the stream, starting at 0.
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// An open camera stream.
pub trait VideoStream: Send {
    /// Grab the current frame for detection.
    fn current_frame(&mut self) -> ShResult<Frame>;

    /// Encode the current frame as a JPEG still.
    fn capture_still(&mut self) -> ShResult<Vec<u8>>;

    /// Stop every track of the stream. Must be idempotent.
    fn stop_tracks(&mut self);
}

/// Camera access. Permission refusal is `CameraPermissionDenied`.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self) -> ShResult<Box<dyn VideoStream>>;
}

/// Output of the face detector for one frame.
#[derive(Debug, Clone)]
pub struct Detection {
    pub landmarks: FaceLandmarks,
    /// Dominant expression label; not used by the state machine.
    pub expression: Option<String>,
}

/// Single-face detector with 68-point landmarks.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// `Ok(None)` when no face is in the frame.
    async fn detect(&self, frame: &Frame) -> ShResult<Option<Detection>>;
}

/// What the frame scheduler produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time to process another frame.
    Frame,
    /// No more frames will be produced.
    Stopped,
}

/// Frame cadence of the capture loop.
#[async_trait]
pub trait FrameScheduler: Send {
    async fn next_frame(&mut self) -> Tick;
}

/// Fixed-interval scheduler, the render cadence of a live camera view.
pub struct IntervalScheduler {
    interval: tokio::time::Interval,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl FrameScheduler for IntervalScheduler {
    async fn next_frame(&mut self) -> Tick {
        self.interval.tick().await;
        Tick::Frame
    }
}

/// Owns the camera stream and stops its tracks on release or drop.
pub struct CameraGuard {
    stream: Option<Box<dyn VideoStream>>,
}

impl CameraGuard {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn stream(&mut self) -> ShResult<&mut (dyn VideoStream + 'static)> {
        self.stream
            .as_deref_mut()
            .ok_or_else(|| ShError::Camera("camera already released".into()))
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Stop all tracks now.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            debug!("camera tracks stopped");
        }
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// External control of a running check.
#[derive(Clone, Default)]
pub struct LivenessControl {
    stopped: Arc<AtomicBool>,
    fail_requested: Arc<AtomicBool>,
}

impl LivenessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the loop without an outcome (restart, dialog torn down).
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Ask the loop to fail the check (user gave up, recording ran out).
    pub fn fail(&self) {
        self.fail_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn fail_requested(&self) -> bool {
        self.fail_requested.load(Ordering::SeqCst)
    }
}

/// Payload of the completion callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessOutcome {
    pub success: bool,
    /// Base64 JPEG, present only on success.
    #[serde(rename = "imageData", default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl LivenessOutcome {
    pub fn succeeded(image: Option<&[u8]>) -> Self {
        Self {
            success: true,
            image_data: image.map(|bytes| BASE64.encode(bytes)),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            image_data: None,
        }
    }

    /// Size of the decoded image in bytes.
    pub fn image_len(&self) -> usize {
        self.image_data
            .as_deref()
            .and_then(|data| BASE64.decode(data).ok())
            .map_or(0, |bytes| bytes.len())
    }

    /// The image as a `data:` URL for display.
    pub fn data_url(&self) -> Option<String> {
        self.image_data
            .as_ref()
            .map(|data| format!("data:image/jpeg;base64,{data}"))
    }
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    Succeeded,
    Failed,
    TimedOut,
    Stopped,
}

/// Summary of one run of the capture loop.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessReport {
    pub end: RunEnd,
    /// Step reached before the session was reset.
    pub final_step: LivenessStep,
    pub blink_count: u32,
    pub frames_processed: u64,
    pub frames_without_face: u64,
    pub detection_errors: u64,
    pub outcome: Option<LivenessOutcome>,
}

type CompletionCallback = Box<dyn FnOnce(LivenessOutcome) + Send>;

/// Runs one liveness check from camera start to completion.
pub struct CaptureLoop {
    session: LivenessSession,
    event_bus: EventBus,
    notifications: NotificationCenter,
    countdown_secs: u64,
    timeout: Option<Duration>,
}

impl CaptureLoop {
    pub fn new(
        session: LivenessSession,
        event_bus: EventBus,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            session,
            event_bus,
            notifications,
            countdown_secs: 3,
            timeout: None,
        }
    }

    pub fn with_countdown(mut self, secs: u64) -> Self {
        self.countdown_secs = secs;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn emit_change(&self, change: StepChange) {
        info!("liveness step {} -> {}", change.from, change.to);
        self.event_bus.emit(AppEvent::LivenessStepChanged {
            from: change.from,
            to: change.to,
        });
    }

    fn complete(&self, callback: &mut Option<CompletionCallback>, outcome: &LivenessOutcome) {
        if let Some(cb) = callback.take() {
            self.event_bus.emit(AppEvent::LivenessCompleted {
                success: outcome.success,
            });
            cb(outcome.clone());
        }
    }

    /// Open the camera and process frames until the check completes or
    /// is stopped. `on_complete` fires at most once, with the outcome.
    ///
    /// A refused camera leaves the session in `waiting`, raises a toast and
    /// returns the error without invoking `on_complete`.
    pub async fn run<F>(
        mut self,
        camera: &dyn Camera,
        detector: &dyn FaceDetector,
        scheduler: &mut dyn FrameScheduler,
        control: &LivenessControl,
        on_complete: F,
    ) -> ShResult<LivenessReport>
    where
        F: FnOnce(LivenessOutcome) + Send + 'static,
    {
        let mut callback: Option<CompletionCallback> = Some(Box::new(on_complete));

        let mut guard = match camera.open().await {
            Ok(stream) => CameraGuard::new(stream),
            Err(e) => {
                warn!("camera could not be opened: {e}");
                self.notifications.error("Camera", &e.user_message());
                return Err(e);
            }
        };

        let change = self.session.start()?;
        self.emit_change(change);

        let started = Instant::now();
        let mut report = LivenessReport {
            end: RunEnd::Stopped,
            final_step: self.session.step(),
            blink_count: 0,
            frames_processed: 0,
            frames_without_face: 0,
            detection_errors: 0,
            outcome: None,
        };

        loop {
            if control.is_stopped() {
                report.end = RunEnd::Stopped;
                break;
            }

            let timed_out = self.timeout.is_some_and(|t| started.elapsed() >= t);
            if control.fail_requested() || timed_out {
                if let Some(change) = self.session.fail() {
                    self.emit_change(change);
                }
                let outcome = LivenessOutcome::failed();
                self.complete(&mut callback, &outcome);
                report.outcome = Some(outcome);
                report.end = if timed_out { RunEnd::TimedOut } else { RunEnd::Failed };
                break;
            }

            if scheduler.next_frame().await == Tick::Stopped {
                if control.fail_requested() {
                    continue;
                }
                report.end = RunEnd::Stopped;
                break;
            }

            let frame = match guard.stream().and_then(|s| s.current_frame()) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("failed to read camera frame: {e}");
                    report.detection_errors += 1;
                    continue;
                }
            };

            report.frames_processed += 1;
            let measurement = match detector.detect(&frame).await {
                Ok(Some(detection)) => Some(Measurement::from_landmarks(&detection.landmarks)),
                Ok(None) => {
                    report.frames_without_face += 1;
                    None
                }
                Err(e) => {
                    warn!("face detection failed on frame {}: {e}", frame.seq);
                    report.detection_errors += 1;
                    continue;
                }
            };

            if let Some(change) = self.session.on_frame(measurement) {
                self.emit_change(change);
            }

            if self.session.step() == LivenessStep::Success {
                let still = match guard.stream().and_then(|s| s.capture_still()) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        error!("failed to capture still after success: {e}");
                        None
                    }
                };
                let outcome = LivenessOutcome::succeeded(still.as_deref());
                self.complete(&mut callback, &outcome);
                report.outcome = Some(outcome);
                report.end = RunEnd::Succeeded;

                for remaining in (1..=self.countdown_secs).rev() {
                    if control.is_stopped() {
                        debug!("countdown cut short at {remaining}s");
                        break;
                    }
                    self.event_bus.emit(AppEvent::LivenessCountdown {
                        remaining_secs: remaining,
                    });
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                break;
            }
        }

        guard.release();
        report.final_step = self.session.step();
        report.blink_count = self.session.blink_count();
        self.session.restart();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStream {
        stopped: Arc<AtomicBool>,
    }

    impl VideoStream for NullStream {
        fn current_frame(&mut self) -> ShResult<Frame> {
            Ok(Frame::default())
        }
        fn capture_still(&mut self) -> ShResult<Vec<u8>> {
            Ok(vec![])
        }
        fn stop_tracks(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_stops_tracks_on_drop() {
        let stopped = Arc::new(AtomicBool::new(false));
        {
            let guard = CameraGuard::new(Box::new(NullStream { stopped: stopped.clone() }));
            assert!(guard.is_active());
        }
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_guard_release_is_idempotent() {
        let stopped = Arc::new(AtomicBool::new(false));
        let mut guard = CameraGuard::new(Box::new(NullStream { stopped: stopped.clone() }));
        guard.release();
        guard.release();
        assert!(!guard.is_active());
        assert!(matches!(guard.stream(), Err(ShError::Camera(_))));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_outcome_json_field_names() {
        let ok = LivenessOutcome::succeeded(Some(b"jpeg"));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["imageData"], "anBlZw==");
        assert_eq!(ok.image_len(), 4);
        assert_eq!(ok.data_url().unwrap(), "data:image/jpeg;base64,anBlZw==");

        let failed = serde_json::to_value(LivenessOutcome::failed()).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false}));
    }

    #[test]
    fn test_control_flags() {
        let control = LivenessControl::new();
        let clone = control.clone();
        assert!(!control.is_stopped());
        clone.stop();
        clone.fail();
        assert!(control.is_stopped());
        assert!(control.fail_requested());
    }
}
