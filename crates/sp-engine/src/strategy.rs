//! Link strategies: pure functions from (anchors, primary motion) to a
//! secondary source's new position or elevation.
//!
//! One function per policy, picked once when the policy changes. Every
//! result depends only on the anchors and the primary's current value,
//! never on where the secondaries are now.

use sp_ir::{
    ElevationPolicy, FieldPolar, Point, PositionPolicy, Radians, SourcesSnapshots,
};

/// Below this radius the primary's angle is undefined.
const RADIUS_EPSILON: f32 = 1e-6;

/// Primary's anchored and current position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrimaryDelta {
    pub anchor: Point,
    pub current: Point,
}

impl PrimaryDelta {
    /// Absolute x/y translation since the anchor.
    pub fn translation(&self) -> Point {
        self.current - self.anchor
    }

    /// Rotation around the field centre since the anchor.
    pub fn angle(&self) -> Radians {
        let from = FieldPolar::of(self.anchor);
        let to = FieldPolar::of(self.current);
        if from.radius < RADIUS_EPSILON || to.radius < RADIUS_EPSILON {
            return Radians::ZERO;
        }
        (to.angle - from.angle).simplified()
    }

    /// Change of distance from the field centre since the anchor.
    pub fn radius(&self) -> f32 {
        FieldPolar::of(self.current).radius - FieldPolar::of(self.anchor).radius
    }
}

/// Primary's anchored and current elevation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElevationDelta {
    pub anchor: Radians,
    pub current: Radians,
}

/// New position of secondary `index`, or `None` to leave it alone.
pub type PositionTransform = fn(&SourcesSnapshots, &PrimaryDelta, usize) -> Option<Point>;

/// New elevation of secondary `index`, or `None` to leave it alone.
pub type ElevationTransform = fn(&SourcesSnapshots, &ElevationDelta, usize) -> Option<Radians>;

/// Select the transform for a position policy.
pub fn position_transform(policy: PositionPolicy) -> PositionTransform {
    match policy {
        PositionPolicy::Independent => independent,
        PositionPolicy::Circular => circular,
        PositionPolicy::CircularFixedRadius => circular_fixed_radius,
        PositionPolicy::CircularFixedAngle => circular_fixed_angle,
        PositionPolicy::CircularFullyFixed => circular_fully_fixed,
        PositionPolicy::DeltaLock => delta_lock,
        PositionPolicy::SymmetricX => symmetric_x,
        PositionPolicy::SymmetricY => symmetric_y,
    }
}

/// Select the transform for an elevation policy.
pub fn elevation_transform(policy: ElevationPolicy) -> ElevationTransform {
    match policy {
        ElevationPolicy::Independent => elevation_independent,
        ElevationPolicy::Equal => elevation_equal,
        ElevationPolicy::BottomTop => elevation_bottom_top,
        ElevationPolicy::TopBottom => elevation_top_bottom,
        ElevationPolicy::DeltaLock => elevation_delta_lock,
    }
}

// ── Position ────────────────────────────────────────────────────────

fn independent(_: &SourcesSnapshots, _: &PrimaryDelta, _: usize) -> Option<Point> {
    None
}

fn around_centre(anchor: Point, angle: Radians, radius: f32) -> Point {
    let polar = FieldPolar::of(anchor);
    FieldPolar {
        radius: (polar.radius + radius).max(0.0),
        angle: polar.angle + angle,
    }
    .to_point()
    .clamped_to_field()
}

fn circular(snaps: &SourcesSnapshots, delta: &PrimaryDelta, index: usize) -> Option<Point> {
    Some(around_centre(snaps.get(index).position, delta.angle(), delta.radius()))
}

fn circular_fixed_radius(
    snaps: &SourcesSnapshots,
    delta: &PrimaryDelta,
    index: usize,
) -> Option<Point> {
    Some(around_centre(snaps.get(index).position, delta.angle(), 0.0))
}

fn circular_fixed_angle(
    snaps: &SourcesSnapshots,
    delta: &PrimaryDelta,
    index: usize,
) -> Option<Point> {
    Some(around_centre(snaps.get(index).position, Radians::ZERO, delta.radius()))
}

fn circular_fully_fixed(snaps: &SourcesSnapshots, _: &PrimaryDelta, index: usize) -> Option<Point> {
    Some(snaps.get(index).position)
}

fn delta_lock(snaps: &SourcesSnapshots, delta: &PrimaryDelta, index: usize) -> Option<Point> {
    Some((snaps.get(index).position + delta.translation()).clamped_to_field())
}

fn symmetric_x(_: &SourcesSnapshots, delta: &PrimaryDelta, _: usize) -> Option<Point> {
    Some(delta.current.mirrored_x())
}

fn symmetric_y(_: &SourcesSnapshots, delta: &PrimaryDelta, _: usize) -> Option<Point> {
    Some(delta.current.mirrored_y())
}

// ── Elevation ───────────────────────────────────────────────────────

fn elevation_independent(_: &SourcesSnapshots, _: &ElevationDelta, _: usize) -> Option<Radians> {
    None
}

fn elevation_equal(_: &SourcesSnapshots, delta: &ElevationDelta, _: usize) -> Option<Radians> {
    Some(delta.current)
}

/// Fraction of the way along the fan for secondary `index`.
fn fan_position(snaps: &SourcesSnapshots, index: usize) -> f32 {
    let last = snaps.len().saturating_sub(1).max(1);
    index as f32 / last as f32
}

fn elevation_bottom_top(
    snaps: &SourcesSnapshots,
    delta: &ElevationDelta,
    index: usize,
) -> Option<Radians> {
    let t = fan_position(snaps, index);
    Some(delta.current + (Radians::QUARTER_TURN - delta.current) * t)
}

fn elevation_top_bottom(
    snaps: &SourcesSnapshots,
    delta: &ElevationDelta,
    index: usize,
) -> Option<Radians> {
    let t = fan_position(snaps, index);
    Some(delta.current * (1.0 - t))
}

fn elevation_delta_lock(
    snaps: &SourcesSnapshots,
    delta: &ElevationDelta,
    index: usize,
) -> Option<Radians> {
    Some(snaps.get(index).elevation + (delta.current - delta.anchor))
}
