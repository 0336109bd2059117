//! Runtime evaluator for waypoint paths.

use sp_ir::{Point, TrajectoryKind, WaypointPath, FIELD_CENTER};

use crate::recorder::PathRecorder;

/// Traversal direction of a back-and-forth trajectory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Maps a normalized cycle phase to a point on a waypoint path.
#[derive(Clone, Debug, Default)]
pub struct TrajectorySampler {
    path: WaypointPath,
    recorder: PathRecorder,
    back_and_forth: bool,
    direction: Direction,
    /// Phase seen on the previous `sample` call, for wrap detection.
    last_phase: f32,
    /// Last computed point; returned unchanged when the path is empty.
    current: Point,
}

impl TrajectorySampler {
    pub fn new() -> Self {
        Self { current: FIELD_CENTER, ..Self::default() }
    }

    pub fn path(&self) -> &WaypointPath {
        &self.path
    }

    /// Waypoints to draw the current shape.
    pub fn drawable_path(&self) -> &[Point] {
        self.path.points()
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn back_and_forth(&self) -> bool {
        self.back_and_forth
    }

    pub fn set_back_and_forth(&mut self, enabled: bool) {
        self.back_and_forth = enabled;
        if !enabled {
            self.direction = Direction::Forward;
        }
    }

    /// Rebuild the path for `kind` starting from `start`.
    ///
    /// Returns where the source should be placed: the first waypoint for
    /// generated shapes, the field centre for recorded ones.
    pub fn build(&mut self, kind: TrajectoryKind, start: Point) -> Point {
        self.path = kind.build(start);
        self.rewind();
        self.current = match self.path.first() {
            Some(first) if !kind.is_recorded() => first,
            _ => FIELD_CENTER,
        };
        self.current
    }

    /// Replace the waypoints wholesale (state restore).
    pub fn restore(&mut self, path: WaypointPath) {
        self.current = path.first().unwrap_or(self.current);
        self.path = path;
        self.rewind();
    }

    /// Forget the phase history: the next `sample` starts a fresh cycle
    /// going forward.
    pub fn rewind(&mut self) {
        self.direction = Direction::Forward;
        self.last_phase = 0.0;
    }

    /// Start a freehand recording at `current`.
    pub fn reset_recording(&mut self, current: Point) {
        self.recorder.reset(&mut self.path, current);
        self.current = current;
    }

    /// Append a smoothed pointer sample to the recording.
    pub fn add_recorded_point(&mut self, raw: Point) -> Point {
        self.recorder.add_point(&mut self.path, raw)
    }

    /// Spread the recording along X (time-on-X drawings).
    pub fn compress_x_axis(&mut self, max_width: f32) {
        self.path.compress_x_axis(max_width);
    }

    /// Point at `phase` in [0, 1).
    ///
    /// With back-and-forth enabled, a phase lower than the previous one
    /// means the cycle wrapped and the direction flips.
    pub fn sample(&mut self, phase: f32) -> Point {
        let len = self.path.len();
        if len == 0 {
            return self.current;
        }

        if self.back_and_forth && phase < self.last_phase {
            self.direction = self.direction.flipped();
        }
        self.last_phase = phase;

        let count = len as f32;
        let mut index = phase * count;
        if self.direction == Direction::Backward {
            index = count - index;
        }
        if index >= count {
            index = libm::fmodf(index, count);
        } else if index < 0.0 {
            index += count;
        }

        let i = (libm::floorf(index) as usize).min(len - 1);
        let frac = index - i as f32;
        self.current = if i + 1 < len {
            self.path.get(i).lerp(self.path.get(i + 1), frac)
        } else {
            self.path.get(len - 1)
        };
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_ir::{ElevationShape, TrajectoryShape};

    fn start() -> Point {
        Point::new(0.5, 0.2)
    }

    #[test]
    fn sample_zero_is_first_waypoint() {
        for shape in TrajectoryShape::ALL {
            if shape.is_recorded() {
                continue;
            }
            let mut sampler = TrajectorySampler::new();
            let placed = sampler.build(TrajectoryKind::Position(shape), start());
            let first = sampler.path().get(0);
            assert_eq!(placed, first);
            assert!(sampler.sample(0.0).distance(first) < 1e-6, "{:?}", shape);
        }
    }

    #[test]
    fn recorded_shapes_centre_the_source() {
        let mut sampler = TrajectorySampler::new();
        let placed = sampler.build(TrajectoryKind::Position(TrajectoryShape::Drawing), start());
        assert_eq!(placed, FIELD_CENTER);
        assert!(sampler.path().is_empty());
    }

    #[test]
    fn empty_path_returns_previous_point() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Position(TrajectoryShape::Realtime), start());
        assert_eq!(sampler.sample(0.3), FIELD_CENTER);
        assert_eq!(sampler.sample(0.9), FIELD_CENTER);
    }

    #[test]
    fn single_waypoint_is_constant() {
        let mut sampler = TrajectorySampler::new();
        sampler.restore(WaypointPath::from_points(alloc::vec![Point::new(0.3, 0.6)]));
        for phase in [0.0, 0.4, 0.99] {
            assert_eq!(sampler.sample(phase), Point::new(0.3, 0.6));
        }
    }

    #[test]
    fn interpolates_between_waypoints() {
        let mut sampler = TrajectorySampler::new();
        sampler.restore(WaypointPath::from_points(alloc::vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]));
        // 0.125 * 4 = index 0.5
        let p = sampler.sample(0.125);
        assert!((p.x - 0.5).abs() < 1e-6 && p.y.abs() < 1e-6);
        // index 3.5 has no successor: last waypoint as-is
        assert_eq!(sampler.sample(0.875), Point::new(0.0, 1.0));
    }

    #[test]
    fn back_and_forth_flips_once_at_wrap() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Position(TrajectoryShape::CircleClockwise), start());
        sampler.set_back_and_forth(true);

        let mut flips = 0;
        let mut last = sampler.direction();
        for phase in [0.0, 0.25, 0.5, 0.75, 0.99, 0.0] {
            sampler.sample(phase);
            if sampler.direction() != last {
                flips += 1;
                last = sampler.direction();
            }
        }
        assert_eq!(flips, 1);
        assert_eq!(sampler.direction(), Direction::Backward);
    }

    #[test]
    fn rewind_does_not_count_as_a_wrap() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Position(TrajectoryShape::CircleClockwise), start());
        sampler.set_back_and_forth(true);
        let early = sampler.sample(0.1);
        sampler.sample(0.7);

        sampler.rewind();
        sampler.sample(0.0);
        assert_eq!(sampler.direction(), Direction::Forward);
        assert_eq!(sampler.sample(0.1), early);
    }

    #[test]
    fn backward_traversal_mirrors_index() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Position(TrajectoryShape::SquareClockwise), start());
        sampler.set_back_and_forth(true);
        let forward = sampler.sample(0.9);
        sampler.sample(0.1); // wrap: now backward
        let backward = sampler.sample(0.1);
        // backward at 0.1 reads index N - 0.1N = 0.9N
        assert!(forward.distance(backward) < 1e-6);
    }

    #[test]
    fn without_back_and_forth_direction_never_changes() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Position(TrajectoryShape::CircleClockwise), start());
        for phase in [0.5, 0.1, 0.6, 0.0] {
            sampler.sample(phase);
        }
        assert_eq!(sampler.direction(), Direction::Forward);
    }

    #[test]
    fn recording_feeds_the_path() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Position(TrajectoryShape::Drawing), start());
        sampler.reset_recording(Point::new(0.2, 0.2));
        sampler.add_recorded_point(Point::new(0.7, 0.2));
        sampler.add_recorded_point(Point::new(0.7, 0.7));
        assert_eq!(sampler.path().len(), 3);
        assert_eq!(sampler.sample(0.0), Point::new(0.2, 0.2));
    }

    #[test]
    fn elevation_recording_compresses_x() {
        let mut sampler = TrajectorySampler::new();
        sampler.build(TrajectoryKind::Elevation(ElevationShape::Drawing), start());
        sampler.reset_recording(Point::new(0.5, 0.5));
        sampler.add_recorded_point(Point::new(0.5, 0.1));
        sampler.compress_x_axis(1.0);
        let xs: alloc::vec::Vec<f32> = sampler.drawable_path().iter().map(|p| p.x).collect();
        assert!(xs[0] < xs[1]);
        assert!((xs[1] - 1.0).abs() < 1e-6);
    }
}
