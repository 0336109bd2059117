//! Playback driver: elapsed time in, source positions out.
//!
//! One driver runs one trajectory (position or elevation) for the
//! primary source. `advance` is the per-tick entry point and does not
//! allocate.

use sp_ir::{
    elevation_to_waypoint_y, waypoint_y_to_elevation, Point, Radians, Source, TrajectoryKind,
    TrajectoryState, WaypointPath, DEFAULT_CYCLE_DURATION, FIELD_CENTER, FIELD_MARGIN,
};

use crate::listener::PositionListener;
use crate::sampler::TrajectorySampler;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Inactive,
    /// Playing, but no position has been produced since activation.
    Armed,
    Active,
}

pub struct PlaybackDriver {
    sampler: TrajectorySampler,
    kind: TrajectoryKind,
    /// Seconds per cycle.
    duration: f64,
    deviation_per_cycle: Radians,
    damping_cycles: u32,
    state: PlaybackState,
    /// Last written point; `None` until the first tick after activation.
    last_position: Option<Point>,
}

impl PlaybackDriver {
    pub fn new(kind: TrajectoryKind) -> Self {
        Self {
            sampler: TrajectorySampler::new(),
            kind,
            duration: DEFAULT_CYCLE_DURATION,
            deviation_per_cycle: Radians::ZERO,
            damping_cycles: 0,
            state: PlaybackState::Inactive,
            last_position: None,
        }
    }

    // --- Accessors ---

    pub fn kind(&self) -> TrajectoryKind {
        self.kind
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != PlaybackState::Inactive
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn back_and_forth(&self) -> bool {
        self.sampler.back_and_forth()
    }

    pub fn deviation_per_cycle(&self) -> Radians {
        self.deviation_per_cycle
    }

    pub fn damping_cycles(&self) -> u32 {
        self.damping_cycles
    }

    pub fn last_position(&self) -> Option<Point> {
        self.last_position
    }

    pub fn path(&self) -> &WaypointPath {
        self.sampler.path()
    }

    pub fn drawable_path(&self) -> &[Point] {
        self.sampler.drawable_path()
    }

    pub fn sampler(&self) -> &TrajectorySampler {
        &self.sampler
    }

    // --- Configuration ---

    /// Select a new trajectory and rebuild its path from where `source`
    /// sits. Generated position shapes move the source onto their first
    /// waypoint; recorded position shapes centre it.
    pub fn set_kind(&mut self, kind: TrajectoryKind, source: &mut Source) {
        self.kind = kind;
        let placed = self.sampler.build(kind, source.position());
        match kind {
            TrajectoryKind::Position(_) => source.set_position(placed),
            TrajectoryKind::Elevation(_) if !kind.is_recorded() => {
                source.set_elevation(waypoint_y_to_elevation(placed.y));
            }
            TrajectoryKind::Elevation(_) => {}
        }
        self.last_position = None;
    }

    pub fn set_duration(&mut self, seconds: f64) {
        self.duration = seconds;
    }

    pub fn set_back_and_forth(&mut self, enabled: bool) {
        self.sampler.set_back_and_forth(enabled);
    }

    pub fn set_deviation_per_cycle(&mut self, angle: Radians) {
        self.deviation_per_cycle = angle;
    }

    pub fn set_damping_cycles(&mut self, cycles: u32) {
        self.damping_cycles = cycles;
    }

    /// Start or stop playback. Stopping forgets the last position;
    /// starting rewinds the traversal.
    pub fn set_active(&mut self, active: bool) {
        if active {
            if self.state == PlaybackState::Inactive {
                self.state = PlaybackState::Armed;
                self.sampler.rewind();
            }
        } else {
            self.state = PlaybackState::Inactive;
            self.last_position = None;
        }
    }

    /// Restart the traversal from phase zero, going forward. The clock
    /// driving `advance` is expected to restart too.
    pub fn rewind(&mut self) {
        self.sampler.rewind();
    }

    /// Whether the next `advance` will notify its listener.
    pub fn notifies(&self) -> bool {
        self.state == PlaybackState::Active || self.kind.is_recorded()
    }

    // --- Recording ---

    /// Begin a freehand recording at the source's current point.
    pub fn start_recording(&mut self, source: &Source) {
        let seed = match self.kind {
            TrajectoryKind::Position(_) => source.position(),
            TrajectoryKind::Elevation(_) => {
                Point::new(FIELD_MARGIN, elevation_to_waypoint_y(source.elevation()))
            }
        };
        self.sampler.reset_recording(seed);
    }

    /// Append a pointer sample. Elevation drawings keep time on X, so the
    /// X axis is re-spread after every point.
    pub fn add_recorded_point(&mut self, raw: Point) -> Point {
        let smoothed = self.sampler.add_recorded_point(raw);
        if let TrajectoryKind::Elevation(_) = self.kind {
            self.sampler.compress_x_axis(1.0 - FIELD_MARGIN);
        }
        smoothed
    }

    // --- Persistence ---

    pub fn to_state(&self) -> TrajectoryState {
        TrajectoryState {
            kind: self.kind,
            path: self.sampler.path().clone(),
            duration: self.duration,
            back_and_forth: self.sampler.back_and_forth(),
            deviation_per_cycle: self.deviation_per_cycle,
            damping_cycles: self.damping_cycles,
            active: self.is_active(),
        }
    }

    /// Install a persisted trajectory without touching any source.
    pub fn restore(&mut self, state: &TrajectoryState) {
        self.kind = state.kind;
        self.sampler.restore(state.path.clone());
        self.sampler.set_back_and_forth(state.back_and_forth);
        self.duration = state.duration;
        self.deviation_per_cycle = state.deviation_per_cycle;
        self.damping_cycles = state.damping_cycles;
        self.state = PlaybackState::Inactive;
        self.last_position = None;
        self.set_active(state.active);
    }

    // ── Tick ────────────────────────────────────────────────────────

    /// Drive `source` to the trajectory point for `elapsed` seconds since
    /// play started.
    ///
    /// Returns the written point, or `None` when nothing moved: inactive,
    /// zero duration, or no waypoints yet.
    pub fn advance(
        &mut self,
        elapsed: f64,
        source: &mut Source,
        listener: &mut dyn PositionListener,
    ) -> Option<Point> {
        let playable = self.duration.is_finite() && self.duration > 0.0;
        if self.state == PlaybackState::Inactive || !playable {
            return None;
        }
        let first = self.sampler.path().first()?;

        let cycles = elapsed / self.duration;
        let phase = (cycles - libm::floor(cycles)) as f32;
        let mut point = self.sampler.sample(phase);

        if self.damping_cycles > 0 {
            let factor = (1.0 - cycles / self.damping_cycles as f64).max(0.0) as f32;
            point = first + (point - first) * factor;
        }

        match self.kind {
            TrajectoryKind::Position(_) => {
                if self.deviation_per_cycle != Radians::ZERO {
                    let angle = self.deviation_per_cycle * cycles as f32;
                    point = point.rotated_around(FIELD_CENTER, angle.simplified());
                }
                source.set_position(point);
            }
            TrajectoryKind::Elevation(_) => {
                source.set_elevation(waypoint_y_to_elevation(point.y));
            }
        }

        let emit = self.notifies();
        self.state = PlaybackState::Active;
        self.last_position = Some(point);
        if emit {
            listener.on_position_changed(source.id(), source.current());
        }
        Some(point)
    }
}
