//! Face landmark geometry: eye opening ratio and head yaw.
//!
//! Landmarks follow the 68-point iBUG layout: jaw 0..=16, nose tip 30,
//! left eye 36..=41, right eye 42..=47.

use serde::{Deserialize, Serialize};

use sh_core::error::{ShError, ShResult};

pub const LANDMARK_COUNT: usize = 68;

const JAW_LEFT: usize = 0;
const JAW_RIGHT: usize = 16;
const NOSE_TIP: usize = 30;
const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Opening ratio of one eye from its six contour points:
/// `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`.
///
/// A degenerate eye (zero width) reads as fully open.
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> f64 {
    let width = eye[0].distance(&eye[3]);
    if width <= f64::EPSILON {
        return f64::INFINITY;
    }
    (eye[1].distance(&eye[5]) + eye[2].distance(&eye[4])) / (2.0 * width)
}

/// A single detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Point>,
}

impl FaceLandmarks {
    /// Wrap detector output. Anything other than 68 points is a detection error.
    pub fn new(points: Vec<Point>) -> ShResult<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(ShError::Detection(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn nose_tip(&self) -> Point {
        self.points[NOSE_TIP]
    }

    /// Midpoint of the outermost jaw points.
    pub fn jaw_midpoint(&self) -> Point {
        self.points[JAW_LEFT].midpoint(&self.points[JAW_RIGHT])
    }

    fn eye(&self, range: std::ops::Range<usize>) -> [Point; 6] {
        let mut eye = [Point::default(); 6];
        eye.copy_from_slice(&self.points[range]);
        eye
    }

    pub fn left_eye(&self) -> [Point; 6] {
        self.eye(LEFT_EYE)
    }

    pub fn right_eye(&self) -> [Point; 6] {
        self.eye(RIGHT_EYE)
    }

    /// Eye opening ratio averaged over both eyes.
    pub fn eye_ratio(&self) -> f64 {
        (eye_aspect_ratio(&self.left_eye()) + eye_aspect_ratio(&self.right_eye())) / 2.0
    }

    /// Head yaw in degrees: `atan2(nose.x - mid.x, nose.y - mid.y)` where
    /// `mid` is the jaw-line midpoint. Negative when the nose is left of
    /// the jaw midpoint in image coordinates.
    pub fn yaw_deg(&self) -> f64 {
        let nose = self.nose_tip();
        let mid = self.jaw_midpoint();
        (nose.x - mid.x).atan2(nose.y - mid.y).to_degrees()
    }

    /// Build a landmark set whose eye ratio and yaw equal the given values.
    ///
    /// Used to replay recorded measurements through the same code path as
    /// real detector output.
    pub fn synthetic(eye_ratio: f64, yaw_deg: f64) -> Self {
        let mut points = vec![Point::default(); LANDMARK_COUNT];

        // Jaw: a flat arc from (-50, 0) to (50, 0), midpoint at the origin.
        for (i, p) in points.iter_mut().enumerate().take(JAW_RIGHT + 1) {
            let t = i as f64 / JAW_RIGHT as f64;
            *p = Point::new(-50.0 + 100.0 * t, 0.0);
        }

        let yaw = yaw_deg.to_radians();
        points[NOSE_TIP] = Point::new(40.0 * yaw.sin(), 40.0 * yaw.cos());

        let width = 20.0;
        let half_height = eye_ratio * width / 2.0;
        for (range, cx) in [(LEFT_EYE, -20.0), (RIGHT_EYE, 20.0)] {
            let cy = -20.0;
            let eye = [
                Point::new(cx - width / 2.0, cy),
                Point::new(cx - 3.0, cy - half_height),
                Point::new(cx + 3.0, cy - half_height),
                Point::new(cx + width / 2.0, cy),
                Point::new(cx + 3.0, cy + half_height),
                Point::new(cx - 3.0, cy + half_height),
            ];
            points[range].copy_from_slice(&eye);
        }

        Self { points }
    }
}
