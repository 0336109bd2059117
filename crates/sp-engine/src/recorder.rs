//! Freehand path recording with exponential smoothing.

use sp_ir::{Point, WaypointPath};

/// Weight of the previous smoothed point in each new one.
pub const SMOOTHING: f32 = 0.8;

/// Turns raw pointer samples into a damped waypoint trail.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathRecorder {
    /// Last smoothed point.
    anchor: Point,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Start a new recording at `current`.
    pub fn reset(&mut self, path: &mut WaypointPath, current: Point) {
        path.clear();
        path.push(current);
        self.anchor = current;
    }

    /// Smooth `raw` toward the trail and append it.
    pub fn add_point(&mut self, path: &mut WaypointPath, raw: Point) -> Point {
        let smoothed = raw + (self.anchor - raw) * SMOOTHING;
        self.anchor = smoothed;
        path.push(smoothed);
        smoothed
    }
}
