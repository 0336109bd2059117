//! Complete persisted state of a spatialization session.

use alloc::vec::Vec;

use crate::angle::Radians;
use crate::coords::SpatMode;
use crate::link::{ElevationPolicy, PositionPolicy, SourcesSnapshots};
use crate::path::WaypointPath;
use crate::shape::TrajectoryKind;
use crate::source::Source;

/// Default cycle duration in seconds.
pub const DEFAULT_CYCLE_DURATION: f64 = 5.0;

/// Persisted settings and waypoints of one playback driver.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryState {
    pub kind: TrajectoryKind,
    /// Generated or recorded waypoints.
    pub path: WaypointPath,
    /// Seconds per cycle.
    pub duration: f64,
    pub back_and_forth: bool,
    /// Rotation applied per completed cycle (position trajectories only).
    pub deviation_per_cycle: Radians,
    /// Cycles until the motion settles on the first waypoint (0 = never).
    pub damping_cycles: u32,
    pub active: bool,
}

impl TrajectoryState {
    pub fn new(kind: TrajectoryKind) -> Self {
        Self {
            kind,
            path: WaypointPath::new(),
            duration: DEFAULT_CYCLE_DURATION,
            back_and_forth: false,
            deviation_per_cycle: Radians::ZERO,
            damping_cycles: 0,
            active: false,
        }
    }
}

/// Everything needed to restore a session identically.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub mode: SpatMode,
    pub sources: Vec<Source>,
    pub position_policy: PositionPolicy,
    pub elevation_policy: ElevationPolicy,
    /// Anchors captured at the last link (re)activation.
    pub snapshots: SourcesSnapshots,
    pub position_trajectory: TrajectoryState,
    pub elevation_trajectory: TrajectoryState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: SpatMode::Dome,
            sources: Vec::new(),
            position_policy: PositionPolicy::Independent,
            elevation_policy: ElevationPolicy::Independent,
            snapshots: SourcesSnapshots::new(),
            position_trajectory: TrajectoryState::new(TrajectoryKind::Position(Default::default())),
            elevation_trajectory: TrajectoryState::new(TrajectoryKind::Elevation(Default::default())),
        }
    }
}
