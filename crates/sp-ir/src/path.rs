//! Ordered waypoint sequences.

use alloc::vec::Vec;

use crate::point::{Point, FIELD_MARGIN};

/// An ordered list of waypoints in field coordinates.
///
/// Rebuilt wholesale whenever the trajectory shape changes or a new
/// recording starts; insertion order is the traversal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaypointPath {
    points: Vec<Point>,
}

impl WaypointPath {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { points: Vec::with_capacity(capacity) }
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Waypoint at `index`. Out-of-range access is a caller bug.
    pub fn get(&self, index: usize) -> Point {
        debug_assert!(index < self.points.len(), "waypoint {} out of {}", index, self.points.len());
        self.points[index]
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Spread the X coordinates evenly over `[FIELD_MARGIN, max_width]`,
    /// keeping Y. Used for time-on-X drawings (elevation recordings).
    pub fn compress_x_axis(&mut self, max_width: f32) {
        let n = self.points.len();
        if n == 0 {
            return;
        }
        if n == 1 {
            self.points[0].x = FIELD_MARGIN;
            return;
        }
        let span = max_width - FIELD_MARGIN;
        let last = (n - 1) as f32;
        for (i, p) in self.points.iter_mut().enumerate() {
            p.x = FIELD_MARGIN + span * (i as f32 / last);
        }
    }
}
