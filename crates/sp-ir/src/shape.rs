//! Trajectory shapes and the waypoint builders behind them.
//!
//! Parametric position shapes are generated around the field centre so
//! that their first waypoint lands on the source's current position:
//! the shape is drawn in a local frame starting at (0, magnitude) and
//! rotated by the polar angle of the source's offset minus a quarter turn.

use core::f32::consts::{PI, TAU};

use crate::angle::Radians;
use crate::path::WaypointPath;
use crate::point::{Point, FIELD_CENTER, FIELD_MARGIN, FIELD_RADIUS};

/// Waypoints generated for circles and ellipses.
pub const CIRCLE_SAMPLES: usize = 200;
/// Waypoints generated for spirals, squares and triangles.
pub const POLYGON_SAMPLES: usize = 300;
/// Waypoints generated for parametric elevation shapes.
pub const ELEVATION_SAMPLES: usize = 200;
/// Full turns a spiral makes over its samples.
pub const SPIRAL_TURNS: f32 = 3.0;
/// Ellipse minor axis relative to its major axis.
const ELLIPSE_RATIO: f32 = 0.5;

// ── Shape kinds ─────────────────────────────────────────────────────

/// Position trajectory shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrajectoryShape {
    /// Follows live pointer input; nothing is generated.
    #[default]
    Realtime = 0,
    /// Replays a freehand recording.
    Drawing = 1,
    CircleClockwise = 2,
    CircleCounterClockwise = 3,
    EllipseClockwise = 4,
    EllipseCounterClockwise = 5,
    SpiralClockwiseOutIn = 6,
    SpiralCounterClockwiseOutIn = 7,
    SpiralClockwiseInOut = 8,
    SpiralCounterClockwiseInOut = 9,
    SquareClockwise = 10,
    SquareCounterClockwise = 11,
    TriangleClockwise = 12,
    TriangleCounterClockwise = 13,
}

impl TrajectoryShape {
    pub const ALL: [Self; 14] = [
        Self::Realtime,
        Self::Drawing,
        Self::CircleClockwise,
        Self::CircleCounterClockwise,
        Self::EllipseClockwise,
        Self::EllipseCounterClockwise,
        Self::SpiralClockwiseOutIn,
        Self::SpiralCounterClockwiseOutIn,
        Self::SpiralClockwiseInOut,
        Self::SpiralCounterClockwiseInOut,
        Self::SquareClockwise,
        Self::SquareCounterClockwise,
        Self::TriangleClockwise,
        Self::TriangleCounterClockwise,
    ];

    /// Whether the path comes from pointer input rather than a formula.
    pub fn is_recorded(self) -> bool {
        matches!(self, Self::Realtime | Self::Drawing)
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Drawing => "drawing",
            Self::CircleClockwise => "circle-cw",
            Self::CircleCounterClockwise => "circle-ccw",
            Self::EllipseClockwise => "ellipse-cw",
            Self::EllipseCounterClockwise => "ellipse-ccw",
            Self::SpiralClockwiseOutIn => "spiral-cw-out-in",
            Self::SpiralCounterClockwiseOutIn => "spiral-ccw-out-in",
            Self::SpiralClockwiseInOut => "spiral-cw-in-out",
            Self::SpiralCounterClockwiseInOut => "spiral-ccw-in-out",
            Self::SquareClockwise => "square-cw",
            Self::SquareCounterClockwise => "square-ccw",
            Self::TriangleClockwise => "triangle-cw",
            Self::TriangleCounterClockwise => "triangle-ccw",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

/// Elevation trajectory shape (cube-mode height automation).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElevationShape {
    #[default]
    Realtime = 0,
    Drawing = 1,
    /// Horizon to zenith.
    DownUp = 2,
    /// Zenith to horizon.
    UpDown = 3,
}

impl ElevationShape {
    pub const ALL: [Self; 4] = [Self::Realtime, Self::Drawing, Self::DownUp, Self::UpDown];

    pub fn is_recorded(self) -> bool {
        matches!(self, Self::Realtime | Self::Drawing)
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Drawing => "drawing",
            Self::DownUp => "down-up",
            Self::UpDown => "up-down",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

/// Which quantity a trajectory drives, and with which shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrajectoryKind {
    Position(TrajectoryShape),
    Elevation(ElevationShape),
}

impl TrajectoryKind {
    pub fn is_recorded(self) -> bool {
        match self {
            Self::Position(s) => s.is_recorded(),
            Self::Elevation(s) => s.is_recorded(),
        }
    }

    /// Generate the waypoints for this kind. Recorded kinds yield an
    /// empty path that is filled at runtime.
    pub fn build(self, start: Point) -> WaypointPath {
        match self {
            Self::Position(s) => build_shape(s, start),
            Self::Elevation(s) => build_elevation_shape(s),
        }
    }
}

impl Default for TrajectoryKind {
    fn default() -> Self {
        Self::Position(TrajectoryShape::default())
    }
}

// ── Elevation encoding ──────────────────────────────────────────────

/// Elevation stored in a waypoint: y = 0 is the zenith, y = 1 the horizon.
pub fn elevation_to_waypoint_y(elevation: Radians) -> f32 {
    1.0 - elevation.to_normalized_elevation().get()
}

pub fn waypoint_y_to_elevation(y: f32) -> Radians {
    Radians((1.0 - y.clamp(0.0, 1.0)) * (PI / 2.0))
}

// ── Builders ────────────────────────────────────────────────────────

/// Synthesize the waypoints of a position shape starting at `start`.
pub fn build_shape(shape: TrajectoryShape, start: Point) -> WaypointPath {
    let offset = start - FIELD_CENTER;
    let magnitude = offset.length().min(FIELD_RADIUS - FIELD_MARGIN);
    let rotation = offset.angle() - Radians::QUARTER_TURN;

    let local: fn(usize, f32) -> Point = match shape {
        TrajectoryShape::Realtime | TrajectoryShape::Drawing => return WaypointPath::new(),
        TrajectoryShape::CircleClockwise => |i, m| circle(i, m, 1.0, 1.0),
        TrajectoryShape::CircleCounterClockwise => |i, m| circle(i, m, 1.0, -1.0),
        TrajectoryShape::EllipseClockwise => |i, m| circle(i, m, ELLIPSE_RATIO, 1.0),
        TrajectoryShape::EllipseCounterClockwise => |i, m| circle(i, m, ELLIPSE_RATIO, -1.0),
        TrajectoryShape::SpiralClockwiseOutIn => |i, m| spiral(i, m, true, 1.0),
        TrajectoryShape::SpiralCounterClockwiseOutIn => |i, m| spiral(i, m, true, -1.0),
        TrajectoryShape::SpiralClockwiseInOut => |i, m| spiral(i, m, false, 1.0),
        TrajectoryShape::SpiralCounterClockwiseInOut => |i, m| spiral(i, m, false, -1.0),
        TrajectoryShape::SquareClockwise => |i, m| polygon(i, m, 4, 1.0),
        TrajectoryShape::SquareCounterClockwise => |i, m| polygon(i, m, 4, -1.0),
        TrajectoryShape::TriangleClockwise => |i, m| polygon(i, m, 3, 1.0),
        TrajectoryShape::TriangleCounterClockwise => |i, m| polygon(i, m, 3, -1.0),
    };

    let count = sample_count(shape);
    let mut path = WaypointPath::with_capacity(count);
    for i in 0..count {
        let p = FIELD_CENTER + local(i, magnitude).rotated(rotation);
        path.push(p.clamped_to_interior());
    }
    path
}

/// Number of waypoints `build_shape` emits for `shape`.
pub fn sample_count(shape: TrajectoryShape) -> usize {
    match shape {
        TrajectoryShape::Realtime | TrajectoryShape::Drawing => 0,
        TrajectoryShape::CircleClockwise
        | TrajectoryShape::CircleCounterClockwise
        | TrajectoryShape::EllipseClockwise
        | TrajectoryShape::EllipseCounterClockwise => CIRCLE_SAMPLES,
        _ => POLYGON_SAMPLES,
    }
}

/// Synthesize an elevation shape (time on X, inverted elevation on Y).
pub fn build_elevation_shape(shape: ElevationShape) -> WaypointPath {
    let (from, to) = match shape {
        ElevationShape::Realtime | ElevationShape::Drawing => return WaypointPath::new(),
        ElevationShape::DownUp => (1.0, 0.0),
        ElevationShape::UpDown => (0.0, 1.0),
    };
    let last = (ELEVATION_SAMPLES - 1) as f32;
    let mut path = WaypointPath::with_capacity(ELEVATION_SAMPLES);
    for i in 0..ELEVATION_SAMPLES {
        let t = i as f32 / last;
        path.push(Point::new(t, from + (to - from) * t));
    }
    path
}

/// Circle/ellipse sweep; `sense` is +1 for clockwise, -1 for counter.
fn circle(i: usize, magnitude: f32, x_ratio: f32, sense: f32) -> Point {
    let t = TAU * i as f32 / (CIRCLE_SAMPLES - 1) as f32;
    Point::new(sense * libm::sinf(t) * magnitude * x_ratio, libm::cosf(t) * magnitude)
}

fn spiral(i: usize, magnitude: f32, out_in: bool, sense: f32) -> Point {
    let progress = i as f32 / POLYGON_SAMPLES as f32;
    let t = TAU * SPIRAL_TURNS * progress;
    let scale = if out_in { 1.0 - progress } else { progress };
    Point::new(sense * libm::sinf(t), libm::cosf(t)) * (magnitude * scale)
}

/// Piecewise-linear walk over a regular polygon whose first vertex is
/// (0, magnitude).
fn polygon(i: usize, magnitude: f32, sides: usize, sense: f32) -> Point {
    let per_side = POLYGON_SAMPLES / sides;
    let side = (i / per_side).min(sides - 1);
    let t = (i - side * per_side) as f32 / per_side as f32;
    let vertex = |k: usize| {
        let a = TAU * (k % sides) as f32 / sides as f32;
        Point::new(sense * libm::sinf(a), libm::cosf(a)) * magnitude
    };
    vertex(side).lerp(vertex(side + 1), t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::Degrees;
    use crate::point::FieldPolar;

    fn start() -> Point {
        FieldPolar { radius: 0.3, angle: Degrees(40.0).into() }.to_point()
    }

    #[test]
    fn sample_counts() {
        assert_eq!(build_shape(TrajectoryShape::CircleClockwise, start()).len(), 200);
        assert_eq!(build_shape(TrajectoryShape::EllipseCounterClockwise, start()).len(), 200);
        assert_eq!(build_shape(TrajectoryShape::SpiralClockwiseInOut, start()).len(), 300);
        assert_eq!(build_shape(TrajectoryShape::SquareClockwise, start()).len(), 300);
        assert_eq!(build_shape(TrajectoryShape::TriangleCounterClockwise, start()).len(), 300);
    }

    #[test]
    fn recorded_shapes_are_empty() {
        assert!(build_shape(TrajectoryShape::Realtime, start()).is_empty());
        assert!(build_shape(TrajectoryShape::Drawing, start()).is_empty());
        assert!(build_elevation_shape(ElevationShape::Drawing).is_empty());
    }

    #[test]
    fn shapes_start_on_the_source() {
        for shape in [
            TrajectoryShape::CircleClockwise,
            TrajectoryShape::CircleCounterClockwise,
            TrajectoryShape::EllipseClockwise,
            TrajectoryShape::SpiralClockwiseOutIn,
            TrajectoryShape::SquareCounterClockwise,
            TrajectoryShape::TriangleClockwise,
        ] {
            let first = build_shape(shape, start()).get(0);
            assert!(first.distance(start()) < 1e-5, "{:?} starts at {:?}", shape, first);
        }
    }

    #[test]
    fn circle_keeps_constant_radius() {
        let path = build_shape(TrajectoryShape::CircleClockwise, start());
        for p in path.points() {
            assert!((p.distance(FIELD_CENTER) - 0.3).abs() < 1e-4);
        }
    }

    #[test]
    fn circle_closes_on_itself() {
        let path = build_shape(TrajectoryShape::CircleCounterClockwise, start());
        assert!(path.get(0).distance(path.get(199)) < 1e-4);
    }

    #[test]
    fn clockwise_and_counter_clockwise_diverge() {
        let cw = build_shape(TrajectoryShape::CircleClockwise, start());
        let ccw = build_shape(TrajectoryShape::CircleCounterClockwise, start());
        assert!(cw.get(50).distance(ccw.get(50)) > 0.1);
    }

    #[test]
    fn spiral_out_in_shrinks() {
        let path = build_shape(TrajectoryShape::SpiralClockwiseOutIn, start());
        let r_first = path.get(0).distance(FIELD_CENTER);
        let r_last = path.get(299).distance(FIELD_CENTER);
        assert!(r_last < r_first * 0.05);
    }

    #[test]
    fn spiral_in_out_starts_at_centre() {
        let path = build_shape(TrajectoryShape::SpiralCounterClockwiseInOut, start());
        assert!(path.get(0).distance(FIELD_CENTER) < 1e-6);
    }

    #[test]
    fn square_hits_its_corners() {
        let path = build_shape(TrajectoryShape::SquareClockwise, start());
        for k in 0..4 {
            let corner = path.get(k * 75);
            assert!((corner.distance(FIELD_CENTER) - 0.3).abs() < 1e-4);
        }
        // Mid-edge of a square is 1/sqrt(2) of the vertex radius.
        let mid = path.get(37).lerp(path.get(38), 0.5);
        assert!((mid.distance(FIELD_CENTER) - 0.3 * core::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
    }

    #[test]
    fn shapes_stay_inside_margin() {
        let edge = Point::new(0.5, 0.0);
        for shape in TrajectoryShape::ALL {
            for p in build_shape(shape, edge).points() {
                assert!(p.x >= FIELD_MARGIN && p.x <= 1.0 - FIELD_MARGIN);
                assert!(p.y >= FIELD_MARGIN && p.y <= 1.0 - FIELD_MARGIN);
            }
        }
    }

    #[test]
    fn elevation_down_up_rises() {
        let path = build_elevation_shape(ElevationShape::DownUp);
        assert_eq!(path.len(), ELEVATION_SAMPLES);
        assert_eq!(waypoint_y_to_elevation(path.get(0).y), Radians::ZERO);
        assert!((waypoint_y_to_elevation(path.get(199).y).0 - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn elevation_encoding_round_trip() {
        let el: Radians = Degrees(30.0).into();
        let back = waypoint_y_to_elevation(elevation_to_waypoint_y(el));
        assert!((back - el).0.abs() < 1e-5);
    }

    #[test]
    fn shape_codes_and_names() {
        for (i, shape) in TrajectoryShape::ALL.iter().enumerate() {
            assert_eq!(*shape as u8 as usize, i);
            assert_eq!(TrajectoryShape::from_name(shape.name()), Some(*shape));
        }
        assert_eq!(TrajectoryShape::from_u8(14), None);
        assert_eq!(ElevationShape::from_name("up-down"), Some(ElevationShape::UpDown));
    }
}
