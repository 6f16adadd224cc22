//! Recorded frame scripts.
//!
//! A script stands in for a camera and a face detector: each entry says
//! what the detector saw on that frame. Used to replay recorded sessions
//! from the command line and to drive the capture loop in tests.
//!
//! ```json
//! {
//!   "permission": "granted",
//!   "frames": [
//!     {"face": false},
//!     {"eye_ratio": 0.12, "yaw_deg": 1.5},
//!     {"error": "model not loaded"},
//!     {"landmarks": [[x, y], ...68 points]}
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sh_core::error::{ShError, ShResult};

use super::capture::{
    Camera, Detection, FaceDetector, Frame, FrameScheduler, LivenessControl, Tick, VideoStream,
};
use super::geometry::{FaceLandmarks, Point};

/// Camera permission recorded in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Granted,
    Denied,
}

/// What the detector reports for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptedFrame {
    Error {
        error: String,
    },
    Landmarks {
        landmarks: Vec<[f64; 2]>,
        #[serde(default)]
        expression: Option<String>,
    },
    Measured {
        eye_ratio: f64,
        yaw_deg: f64,
        #[serde(default)]
        expression: Option<String>,
    },
    /// Must be written `{"face": false}`. Anything the other variants
    /// reject is a broken entry, not a frame without a face.
    NoFace {
        face: bool,
    },
}

impl ScriptedFrame {
    pub fn blink() -> Self {
        Self::Measured { eye_ratio: 0.1, yaw_deg: 0.0, expression: None }
    }

    pub fn look(yaw_deg: f64) -> Self {
        Self::Measured { eye_ratio: 0.3, yaw_deg, expression: None }
    }

    pub fn no_face() -> Self {
        Self::NoFace { face: false }
    }

    pub fn error(message: &str) -> Self {
        Self::Error { error: message.to_string() }
    }

    fn detection(&self) -> ShResult<Option<Detection>> {
        match self {
            Self::Error { error } => Err(ShError::Detection(error.clone())),
            Self::NoFace { .. } => Ok(None),
            Self::Measured { eye_ratio, yaw_deg, expression } => Ok(Some(Detection {
                landmarks: FaceLandmarks::synthetic(*eye_ratio, *yaw_deg),
                expression: expression.clone(),
            })),
            Self::Landmarks { landmarks, expression } => {
                let points = landmarks.iter().map(|[x, y]| Point::new(*x, *y)).collect();
                Ok(Some(Detection {
                    landmarks: FaceLandmarks::new(points)?,
                    expression: expression.clone(),
                }))
            }
        }
    }
}

/// A recorded session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameScript {
    #[serde(default)]
    pub permission: Permission,
    #[serde(default)]
    pub frames: Vec<ScriptedFrame>,
}

impl FrameScript {
    pub fn new(frames: Vec<ScriptedFrame>) -> Self {
        Self {
            permission: Permission::Granted,
            frames,
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            frames: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> ShResult<Self> {
        let script: Self = serde_json::from_str(json)?;
        if let Some(pos) = script
            .frames
            .iter()
            .position(|f| matches!(f, ScriptedFrame::NoFace { face: true }))
        {
            return Err(ShError::InvalidInput(format!(
                "frame {pos}: \"face\": true needs eye_ratio and yaw_deg or landmarks"
            )));
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> ShResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Camera backed by a script. Counts how often streams were opened and
/// whether the last one was stopped.
#[derive(Clone)]
pub struct ScriptedCamera {
    script: Arc<FrameScript>,
    opened: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl ScriptedCamera {
    pub fn new(script: Arc<FrameScript>) -> Self {
        Self {
            script,
            opened: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn times_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn tracks_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn open(&self) -> ShResult<Box<dyn VideoStream>> {
        if self.script.permission == Permission::Denied {
            return Err(ShError::CameraPermissionDenied(
                "NotAllowedError: permission denied".into(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            next_seq: 0,
            stopped: self.stopped.clone(),
        }))
    }
}

struct ScriptedStream {
    next_seq: u64,
    stopped: Arc<AtomicBool>,
}

impl VideoStream for ScriptedStream {
    fn current_frame(&mut self) -> ShResult<Frame> {
        let frame = Frame {
            seq: self.next_seq,
            width: 640,
            height: 480,
            data: Vec::new(),
        };
        self.next_seq += 1;
        Ok(frame)
    }

    fn capture_still(&mut self) -> ShResult<Vec<u8>> {
        // JPEG SOI/EOI markers around the frame number.
        let mut still = vec![0xFF, 0xD8];
        still.extend_from_slice(&self.next_seq.to_be_bytes());
        still.extend_from_slice(&[0xFF, 0xD9]);
        Ok(still)
    }

    fn stop_tracks(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Detector that reports the script entry for each frame. Frames past the
/// end of the script show no face.
pub struct ScriptedDetector {
    script: Arc<FrameScript>,
}

impl ScriptedDetector {
    pub fn new(script: Arc<FrameScript>) -> Self {
        Self { script }
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    async fn detect(&self, frame: &Frame) -> ShResult<Option<Detection>> {
        match self.script.frames.get(frame.seq as usize) {
            Some(entry) => entry.detection(),
            None => Ok(None),
        }
    }
}

/// Produces one tick per script entry. When the recording runs out it
/// raises the failure signal, as a user closing the dialog would.
pub struct ScriptedScheduler {
    remaining: usize,
    control: Option<LivenessControl>,
}

impl ScriptedScheduler {
    pub fn new(frames: usize) -> Self {
        Self {
            remaining: frames,
            control: None,
        }
    }

    pub fn fail_when_exhausted(mut self, control: LivenessControl) -> Self {
        self.control = Some(control);
        self
    }
}

#[async_trait]
impl FrameScheduler for ScriptedScheduler {
    async fn next_frame(&mut self) -> Tick {
        if self.remaining == 0 {
            if let Some(control) = &self.control {
                control.fail();
            }
            return Tick::Stopped;
        }
        self.remaining -= 1;
        tokio::task::yield_now().await;
        Tick::Frame
    }
}
