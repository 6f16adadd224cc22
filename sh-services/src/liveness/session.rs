//! Liveness-check state machine.
//!
//! Pure and synchronous: the capture loop feeds it one measurement per
//! detected face and acts on the step changes it reports.
//!
//! ```text
//! waiting --start--> blink --2 blinks--> turn_left --yaw < -15--> turn_right --yaw > +15--> success
//!    \_____________________ fail (external signal) ______________________________________/--> failed
//! ```

use serde::{Deserialize, Serialize};

use sh_core::config::LivenessConfig;
use sh_core::error::{ShError, ShResult};

use super::geometry::FaceLandmarks;

/// Current instruction shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessStep {
    Waiting,
    Blink,
    TurnLeft,
    TurnRight,
    Success,
    Failed,
}

impl LivenessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Blink => "blink",
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Prompt displayed while in this step.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Waiting => "Starting camera...",
            Self::Blink => "Blink twice",
            Self::TurnLeft => "Turn your head to the left",
            Self::TurnRight => "Now turn your head to the right",
            Self::Success => "Verification successful",
            Self::Failed => "Verification failed",
        }
    }
}

impl std::fmt::Display for LivenessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// A frame is a blink when the eye ratio is strictly below this.
    pub blink_ratio: f64,
    /// Blink frames needed to leave the blink step.
    pub required_blinks: u32,
    /// Yaw (degrees) that each turn must strictly exceed.
    pub yaw_deg: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blink_ratio: 0.2,
            required_blinks: 2,
            yaw_deg: 15.0,
        }
    }
}

impl From<&LivenessConfig> for Thresholds {
    fn from(config: &LivenessConfig) -> Self {
        Self {
            blink_ratio: config.blink_ratio_threshold,
            required_blinks: config.required_blinks,
            yaw_deg: config.yaw_threshold_deg,
        }
    }
}

/// What the machine needs from one detected face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub eye_ratio: f64,
    pub yaw_deg: f64,
}

impl Measurement {
    pub fn from_landmarks(face: &FaceLandmarks) -> Self {
        Self {
            eye_ratio: face.eye_ratio(),
            yaw_deg: face.yaw_deg(),
        }
    }
}

/// A step change reported by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    pub from: LivenessStep,
    pub to: LivenessStep,
}

/// One verification attempt.
#[derive(Debug, Clone)]
pub struct LivenessSession {
    thresholds: Thresholds,
    step: LivenessStep,
    blink_count: u32,
    face_angle_deg: Option<f64>,
    has_completed_left: bool,
    has_completed_right: bool,
}

impl LivenessSession {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            step: LivenessStep::Waiting,
            blink_count: 0,
            face_angle_deg: None,
            has_completed_left: false,
            has_completed_right: false,
        }
    }

    pub fn step(&self) -> LivenessStep {
        self.step
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    /// Yaw of the last face seen, if any.
    pub fn face_angle_deg(&self) -> Option<f64> {
        self.face_angle_deg
    }

    pub fn has_completed_left(&self) -> bool {
        self.has_completed_left
    }

    pub fn has_completed_right(&self) -> bool {
        self.has_completed_right
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn advance(&mut self, to: LivenessStep) -> StepChange {
        let change = StepChange { from: self.step, to };
        self.step = to;
        change
    }

    /// Camera is streaming: begin with the blink step.
    pub fn start(&mut self) -> ShResult<StepChange> {
        if self.step != LivenessStep::Waiting {
            return Err(ShError::SessionActive);
        }
        Ok(self.advance(LivenessStep::Blink))
    }

    /// Feed one frame. `None` means no face was found; the frame is skipped.
    pub fn on_frame(&mut self, measurement: Option<Measurement>) -> Option<StepChange> {
        let m = measurement?;
        if self.step.is_terminal() {
            return None;
        }
        self.face_angle_deg = Some(m.yaw_deg);

        match self.step {
            LivenessStep::Blink => {
                if m.eye_ratio < self.thresholds.blink_ratio {
                    self.blink_count += 1;
                }
                (self.blink_count >= self.thresholds.required_blinks)
                    .then(|| self.advance(LivenessStep::TurnLeft))
            }
            LivenessStep::TurnLeft => {
                if m.yaw_deg < -self.thresholds.yaw_deg {
                    self.has_completed_left = true;
                    Some(self.advance(LivenessStep::TurnRight))
                } else {
                    None
                }
            }
            LivenessStep::TurnRight => {
                if m.yaw_deg > self.thresholds.yaw_deg && self.has_completed_left {
                    self.has_completed_right = true;
                    Some(self.advance(LivenessStep::Success))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// External failure signal (user dismissal, timeout).
    pub fn fail(&mut self) -> Option<StepChange> {
        (!self.step.is_terminal()).then(|| self.advance(LivenessStep::Failed))
    }

    /// Reset counters and flags and return to waiting.
    pub fn restart(&mut self) {
        *self = Self::new(self.thresholds);
    }
}

impl Default for LivenessSession {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OPEN: f64 = 0.3;
    const CLOSED: f64 = 0.1;

    fn blink() -> Option<Measurement> {
        Some(Measurement { eye_ratio: CLOSED, yaw_deg: 0.0 })
    }

    fn look(yaw_deg: f64) -> Option<Measurement> {
        Some(Measurement { eye_ratio: OPEN, yaw_deg })
    }

    fn started() -> LivenessSession {
        let mut s = LivenessSession::default();
        s.start().unwrap();
        s
    }

    #[test]
    fn test_start_enters_blink() {
        let mut s = LivenessSession::default();
        let change = s.start().unwrap();
        assert_eq!(change, StepChange { from: LivenessStep::Waiting, to: LivenessStep::Blink });
        assert!(matches!(s.start(), Err(ShError::SessionActive)));
    }

    #[test]
    fn test_full_sequence_succeeds() {
        let mut s = started();
        for frame in [blink(), blink(), look(-20.0), look(20.0)] {
            s.on_frame(frame);
        }
        assert_eq!(s.step(), LivenessStep::Success);
        assert!(s.has_completed_left());
        assert!(s.has_completed_right());
    }

    #[test]
    fn test_single_blink_stays_in_blink() {
        let mut s = started();
        for frame in [blink(), look(-20.0), look(20.0)] {
            s.on_frame(frame);
        }
        assert_eq!(s.step(), LivenessStep::Blink);
        assert_eq!(s.blink_count(), 1);
    }

    #[test]
    fn test_blink_threshold_is_strict() {
        let mut s = started();
        s.on_frame(Some(Measurement { eye_ratio: 0.2, yaw_deg: 0.0 }));
        assert_eq!(s.blink_count(), 0);
        s.on_frame(Some(Measurement { eye_ratio: 0.199, yaw_deg: 0.0 }));
        assert_eq!(s.blink_count(), 1);
    }

    #[test]
    fn test_turn_left_boundary() {
        let mut s = started();
        s.on_frame(blink());
        s.on_frame(blink());
        assert_eq!(s.step(), LivenessStep::TurnLeft);

        assert!(s.on_frame(look(-15.0)).is_none());
        assert_eq!(s.step(), LivenessStep::TurnLeft);
        assert_eq!(s.face_angle_deg(), Some(-15.0));

        s.on_frame(look(-15.01));
        assert_eq!(s.step(), LivenessStep::TurnRight);
    }

    #[test]
    fn test_turn_right_boundary() {
        let mut s = started();
        for frame in [blink(), blink(), look(-30.0), look(15.0)] {
            s.on_frame(frame);
        }
        assert_eq!(s.step(), LivenessStep::TurnRight);
        s.on_frame(look(15.5));
        assert_eq!(s.step(), LivenessStep::Success);
    }

    #[test]
    fn test_no_face_frames_are_skipped() {
        let mut s = started();
        assert!(s.on_frame(None).is_none());
        assert_eq!(s.face_angle_deg(), None);
        assert_eq!(s.step(), LivenessStep::Blink);
    }

    #[test]
    fn test_waiting_ignores_frames() {
        let mut s = LivenessSession::default();
        s.on_frame(blink());
        s.on_frame(blink());
        assert_eq!(s.step(), LivenessStep::Waiting);
        assert_eq!(s.blink_count(), 0);
    }

    #[test]
    fn test_fail_only_from_non_terminal() {
        let mut s = started();
        assert_eq!(s.fail().map(|c| c.to), Some(LivenessStep::Failed));
        assert!(s.fail().is_none());
        assert!(s.on_frame(blink()).is_none());
        assert_eq!(s.step(), LivenessStep::Failed);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut s = started();
        for frame in [blink(), blink(), look(-20.0)] {
            s.on_frame(frame);
        }
        s.restart();
        assert_eq!(s.step(), LivenessStep::Waiting);
        assert_eq!(s.blink_count(), 0);
        assert!(!s.has_completed_left());
        assert!(!s.has_completed_right());
        assert_eq!(s.face_angle_deg(), None);
    }

    #[test]
    fn test_custom_thresholds_from_config() {
        let config = LivenessConfig {
            required_blinks: 3,
            ..Default::default()
        };
        let mut s = LivenessSession::new(Thresholds::from(&config));
        s.start().unwrap();
        s.on_frame(blink());
        s.on_frame(blink());
        assert_eq!(s.step(), LivenessStep::Blink);
        s.on_frame(blink());
        assert_eq!(s.step(), LivenessStep::TurnLeft);
    }

    fn frame_strategy() -> impl Strategy<Value = Option<Measurement>> {
        prop_oneof![
            1 => Just(None),
            4 => (0.0f64..0.5, -60.0f64..60.0)
                .prop_map(|(eye_ratio, yaw_deg)| Some(Measurement { eye_ratio, yaw_deg })),
        ]
    }

    proptest! {
        #[test]
        fn prop_step_never_regresses(frames in prop::collection::vec(frame_strategy(), 0..60)) {
            let mut s = started();
            let mut last = s.step();
            for frame in frames {
                if let Some(change) = s.on_frame(frame) {
                    prop_assert!(change.to > change.from);
                }
                prop_assert!(s.step() >= last);
                last = s.step();
            }
        }

        #[test]
        fn prop_leaves_blink_only_after_required_blinks(
            frames in prop::collection::vec(frame_strategy(), 0..40)
        ) {
            let mut s = started();
            let mut blinks_in_blink_step = 0u32;
            for frame in frames {
                let before = s.step();
                if before == LivenessStep::Blink {
                    if let Some(m) = frame {
                        if m.eye_ratio < 0.2 {
                            blinks_in_blink_step += 1;
                        }
                    }
                }
                s.on_frame(frame);
                if before == LivenessStep::Blink {
                    prop_assert_eq!(
                        s.step() == LivenessStep::TurnLeft,
                        blinks_in_blink_step >= 2
                    );
                }
            }
        }

        #[test]
        fn prop_turn_left_iff_yaw_below_threshold(yaw in -60.0f64..60.0) {
            let mut s = started();
            s.on_frame(blink());
            s.on_frame(blink());
            s.on_frame(look(yaw));
            prop_assert_eq!(s.step() == LivenessStep::TurnRight, yaw < -15.0);
            prop_assert_eq!(s.has_completed_left(), yaw < -15.0);
        }

        #[test]
        fn prop_success_requires_left_turn(frames in prop::collection::vec(frame_strategy(), 0..60)) {
            let mut s = started();
            for frame in frames {
                let left_before = s.has_completed_left();
                s.on_frame(frame);
                if s.step() == LivenessStep::Success {
                    prop_assert!(left_before);
                    prop_assert!(s.has_completed_right());
                }
            }
        }

        #[test]
        fn prop_restart_from_any_state(
            frames in prop::collection::vec(frame_strategy(), 0..60),
            fail in any::<bool>(),
        ) {
            let mut s = started();
            for frame in frames {
                s.on_frame(frame);
            }
            if fail {
                s.fail();
            }
            s.restart();
            prop_assert_eq!(s.step(), LivenessStep::Waiting);
            prop_assert_eq!(s.blink_count(), 0);
            prop_assert!(!s.has_completed_left());
            prop_assert!(!s.has_completed_right());
        }
    }
}
