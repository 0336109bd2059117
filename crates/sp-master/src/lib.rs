//! Headless session controller for spatium.
//!
//! Provides a single API over sources, link enforcement, trajectory
//! playback and persistence that the UI, host automation, OSC input and
//! CLI can share. Every call is synchronous; position listeners fire
//! inside the call that moved the source.

mod channel;
mod config;
mod settings;

use sp_engine::{
    ChangedSources, LinkOutcome, LinkState, ListenerList, PlaybackDriver, SourceLinkEnforcer,
    PRIMARY,
};

// Re-export common types so callers don't need sp-ir/sp-engine directly.
pub use sp_engine::{ListenerId, MoveOutcome, PlaybackState, PositionListener};
pub use sp_formats::FormatError;
pub use sp_ir::{
    Degrees, ElevationPolicy, ElevationShape, Normalized, Point, PositionPolicy, Radians,
    SessionState, Source, SourceId, SourcePosition, SpatMode, TrajectoryKind, TrajectoryShape,
    MAX_SOURCES,
};

pub use channel::{event_channel, EventReceiver, EventSender, PositionEvent};
pub use config::{SessionConfig, DEFAULT_TICK_RATE};
pub use settings::{InMemorySettings, SettingsService};

/// Which of the two playback drivers a call addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrajectoryAxis {
    Position,
    Elevation,
}

/// Result of a user or host move of one source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    /// The move was rejected and the user asked to be told about it.
    pub warn: bool,
}

/// Headless spatialization session: owns the sources and everything that
/// moves them.
pub struct Session {
    config: SessionConfig,
    sources: Vec<Source>,
    enforcer: SourceLinkEnforcer,
    position_driver: PlaybackDriver,
    elevation_driver: PlaybackDriver,
    listeners: ListenerList,
    settings: Box<dyn SettingsService>,
    /// Seconds since play started.
    elapsed: f64,
}

fn default_layout(config: &SessionConfig) -> Vec<Source> {
    let count = config.clamped_source_count();
    (0..count)
        .map(|i| Source::evenly_spaced(i, count, config.layout_radius, config.mode))
        .collect()
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_settings(config, Box::new(InMemorySettings::default()))
    }

    pub fn with_settings(config: SessionConfig, settings: Box<dyn SettingsService>) -> Self {
        let mut position_driver =
            PlaybackDriver::new(TrajectoryKind::Position(TrajectoryShape::default()));
        let mut elevation_driver =
            PlaybackDriver::new(TrajectoryKind::Elevation(ElevationShape::default()));
        position_driver.set_duration(config.cycle_duration);
        elevation_driver.set_duration(config.cycle_duration);

        let mut session = Self {
            sources: default_layout(&config),
            config,
            enforcer: SourceLinkEnforcer::new(),
            position_driver,
            elevation_driver,
            listeners: ListenerList::new(),
            settings,
            elapsed: 0.0,
        };
        session.enforcer.snapshot(&mut session.sources);
        log::info!(
            "[session] {} sources, {} mode",
            session.sources.len(),
            session.config.mode.name()
        );
        session
    }

    // --- Accessors ---

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> SpatMode {
        self.config.mode
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn source(&self, index: usize) -> &Source {
        &self.sources[index]
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn position_policy(&self) -> PositionPolicy {
        self.enforcer.position_policy()
    }

    pub fn elevation_policy(&self) -> ElevationPolicy {
        self.enforcer.elevation_policy()
    }

    pub fn link_state(&self) -> LinkState {
        self.enforcer.state()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn settings(&self) -> &dyn SettingsService {
        self.settings.as_ref()
    }

    pub fn settings_mut(&mut self) -> &mut dyn SettingsService {
        self.settings.as_mut()
    }

    fn driver(&self, axis: TrajectoryAxis) -> &PlaybackDriver {
        match axis {
            TrajectoryAxis::Position => &self.position_driver,
            TrajectoryAxis::Elevation => &self.elevation_driver,
        }
    }

    fn driver_mut(&mut self, axis: TrajectoryAxis) -> &mut PlaybackDriver {
        match axis {
            TrajectoryAxis::Position => &mut self.position_driver,
            TrajectoryAxis::Elevation => &mut self.elevation_driver,
        }
    }

    pub fn trajectory_kind(&self, axis: TrajectoryAxis) -> TrajectoryKind {
        self.driver(axis).kind()
    }

    pub fn cycle_duration(&self, axis: TrajectoryAxis) -> f64 {
        self.driver(axis).duration()
    }

    pub fn back_and_forth(&self, axis: TrajectoryAxis) -> bool {
        self.driver(axis).back_and_forth()
    }

    pub fn playback_state(&self, axis: TrajectoryAxis) -> PlaybackState {
        self.driver(axis).state()
    }

    /// Waypoints of the current shape, for drawing.
    pub fn drawable_path(&self, axis: TrajectoryAxis) -> &[Point] {
        self.driver(axis).drawable_path()
    }

    // --- Listeners ---

    pub fn add_listener(&mut self, listener: Box<dyn PositionListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    fn emit(&mut self, index: usize) {
        let source = &self.sources[index];
        self.listeners.on_position_changed(source.id(), source.current());
    }

    fn emit_changed(&mut self, changed: &ChangedSources) {
        for &index in changed {
            self.emit(index);
        }
    }

    fn emit_every(&mut self) {
        for index in 0..self.sources.len() {
            self.emit(index);
        }
    }

    // --- Layout ---

    /// Switch spatialization mode. Sources return to the default layout.
    pub fn set_mode(&mut self, mode: SpatMode) {
        log::info!("[session] mode {} -> {}", self.config.mode.name(), mode.name());
        self.config.mode = mode;
        self.sources = default_layout(&self.config);
        self.enforcer.set_position_policy(self.enforcer.position_policy(), &mut self.sources);
        self.enforcer.set_elevation_policy(self.enforcer.elevation_policy(), &mut self.sources);
        self.emit_every();
    }

    /// Change the number of sources. Sources return to the default
    /// layout and link anchors are recaptured from it.
    pub fn set_source_count(&mut self, count: usize) {
        self.config.source_count = count;
        let count = self.config.clamped_source_count();
        log::info!("[session] {} -> {} sources", self.sources.len(), count);
        self.sources = default_layout(&self.config);
        self.enforcer.snapshot(&mut self.sources);
        self.emit_every();
    }

    // --- Source parameters ---

    fn finish_move(&mut self, index: usize, link: LinkOutcome) -> MoveReport {
        self.emit(index);
        self.emit_changed(&link.changed);
        let warn = match link.outcome {
            MoveOutcome::Rejected => {
                log::debug!("[link] source {} is locked by the link policy", index);
                self.settings.show_link_warning()
            }
            MoveOutcome::Resnapshotted => {
                log::debug!("[link] source {} moved, anchors recaptured", index);
                false
            }
            MoveOutcome::Unlinked | MoveOutcome::Propagated => false,
        };
        MoveReport { outcome: link.outcome, warn }
    }

    fn position_moved(&mut self, index: usize) -> MoveReport {
        let link = self.enforcer.source_moved(index, &mut self.sources);
        self.finish_move(index, link)
    }

    fn elevation_moved(&mut self, index: usize) -> MoveReport {
        // In dome mode elevation is part of the x/y position.
        let link = match self.config.mode {
            SpatMode::Dome => self.enforcer.source_moved(index, &mut self.sources),
            SpatMode::Cube => self.enforcer.elevation_moved(index, &mut self.sources),
        };
        self.finish_move(index, link)
    }

    pub fn set_source_position(&mut self, index: usize, position: Point) -> MoveReport {
        self.sources[index].set_position(position);
        self.position_moved(index)
    }

    pub fn set_source_x(&mut self, index: usize, x: f32) -> MoveReport {
        self.sources[index].set_x(x);
        self.position_moved(index)
    }

    pub fn set_source_y(&mut self, index: usize, y: f32) -> MoveReport {
        self.sources[index].set_y(y);
        self.position_moved(index)
    }

    pub fn set_source_azimuth(&mut self, index: usize, azimuth: Radians) -> MoveReport {
        self.sources[index].set_azimuth(azimuth);
        self.position_moved(index)
    }

    /// Azimuth on the host parameter scale.
    pub fn set_source_normalized_azimuth(&mut self, index: usize, value: Normalized) -> MoveReport {
        self.sources[index].set_normalized_azimuth(value);
        self.position_moved(index)
    }

    pub fn set_source_distance(&mut self, index: usize, distance: f32) -> MoveReport {
        self.sources[index].set_distance(distance);
        self.position_moved(index)
    }

    pub fn set_source_elevation(&mut self, index: usize, elevation: Radians) -> MoveReport {
        self.sources[index].set_elevation(elevation);
        self.elevation_moved(index)
    }

    pub fn set_source_normalized_elevation(
        &mut self,
        index: usize,
        value: Normalized,
    ) -> MoveReport {
        self.sources[index].set_normalized_elevation(value);
        self.elevation_moved(index)
    }

    pub fn set_source_azimuth_span(&mut self, index: usize, span: Normalized) {
        self.sources[index].set_azimuth_span(span);
    }

    pub fn set_source_elevation_span(&mut self, index: usize, span: Normalized) {
        self.sources[index].set_elevation_span(span);
    }

    pub fn set_source_id(&mut self, index: usize, id: SourceId) {
        self.sources[index].set_id(id);
    }

    // --- Link policies ---

    pub fn set_position_policy(&mut self, policy: PositionPolicy) {
        log::info!("[session] position link {}", policy.name());
        let changed = self.enforcer.set_position_policy(policy, &mut self.sources);
        self.emit_changed(&changed);
    }

    pub fn set_elevation_policy(&mut self, policy: ElevationPolicy) {
        log::info!("[session] elevation link {}", policy.name());
        let changed = self.enforcer.set_elevation_policy(policy, &mut self.sources);
        self.emit_changed(&changed);
    }

    // --- Trajectories ---

    /// Select the primary's position shape; generated shapes move it onto
    /// their first waypoint.
    pub fn set_position_shape(&mut self, shape: TrajectoryShape) {
        log::debug!("[session] position shape {}", shape.name());
        self.position_driver
            .set_kind(TrajectoryKind::Position(shape), &mut self.sources[PRIMARY]);
        self.position_moved(PRIMARY);
    }

    pub fn set_elevation_shape(&mut self, shape: ElevationShape) {
        log::debug!("[session] elevation shape {}", shape.name());
        self.elevation_driver
            .set_kind(TrajectoryKind::Elevation(shape), &mut self.sources[PRIMARY]);
        self.elevation_moved(PRIMARY);
    }

    pub fn set_cycle_duration(&mut self, axis: TrajectoryAxis, seconds: f64) {
        self.driver_mut(axis).set_duration(seconds);
    }

    pub fn set_back_and_forth(&mut self, axis: TrajectoryAxis, enabled: bool) {
        self.driver_mut(axis).set_back_and_forth(enabled);
    }

    pub fn set_damping_cycles(&mut self, axis: TrajectoryAxis, cycles: u32) {
        self.driver_mut(axis).set_damping_cycles(cycles);
    }

    pub fn set_deviation_per_cycle(&mut self, angle: Radians) {
        self.position_driver.set_deviation_per_cycle(angle);
    }

    pub fn set_active(&mut self, axis: TrajectoryAxis, active: bool) {
        self.driver_mut(axis).set_active(active);
    }

    /// Activate both drivers and restart the clock.
    pub fn play(&mut self) {
        self.elapsed = 0.0;
        for driver in [&mut self.position_driver, &mut self.elevation_driver] {
            driver.set_active(true);
            driver.rewind();
        }
    }

    pub fn stop(&mut self) {
        self.position_driver.set_active(false);
        self.elevation_driver.set_active(false);
    }

    pub fn is_playing(&self) -> bool {
        self.position_driver.is_active() || self.elevation_driver.is_active()
    }

    // --- Recording ---

    /// Begin a freehand recording from the primary's current point.
    pub fn start_recording(&mut self, axis: TrajectoryAxis) {
        let primary = &self.sources[PRIMARY];
        match axis {
            TrajectoryAxis::Position => self.position_driver.start_recording(primary),
            TrajectoryAxis::Elevation => self.elevation_driver.start_recording(primary),
        }
    }

    /// Feed one pointer sample. In the realtime shapes the primary follows
    /// the smoothed point as it is drawn.
    pub fn add_recorded_point(&mut self, axis: TrajectoryAxis, raw: Point) -> Point {
        let smoothed = self.driver_mut(axis).add_recorded_point(raw);
        match self.driver(axis).kind() {
            TrajectoryKind::Position(TrajectoryShape::Realtime) => {
                self.sources[PRIMARY].set_position(smoothed);
                self.position_moved(PRIMARY);
            }
            TrajectoryKind::Elevation(ElevationShape::Realtime) => {
                let elevation = sp_ir::waypoint_y_to_elevation(smoothed.y);
                self.sources[PRIMARY].set_elevation(elevation);
                self.elevation_moved(PRIMARY);
            }
            _ => {}
        }
        smoothed
    }

    // --- Playback ---

    /// Move the primary to where the trajectories put it `elapsed`
    /// seconds after play, then propagate to linked sources.
    ///
    /// Returns whether anything moved.
    pub fn advance(&mut self, elapsed: f64) -> bool {
        self.elapsed = elapsed;
        let mut moved = false;

        // Followers are announced only on ticks that announce the primary.
        let announce = self.position_driver.notifies();
        let written = self.position_driver.advance(
            elapsed,
            &mut self.sources[PRIMARY],
            &mut self.listeners,
        );
        if written.is_some() {
            let link = self.enforcer.source_moved(PRIMARY, &mut self.sources);
            if announce {
                self.emit_changed(&link.changed);
            }
            moved = true;
        }

        if self.config.mode == SpatMode::Cube {
            let announce = self.elevation_driver.notifies();
            let written = self.elevation_driver.advance(
                elapsed,
                &mut self.sources[PRIMARY],
                &mut self.listeners,
            );
            if written.is_some() {
                let link = self.enforcer.elevation_moved(PRIMARY, &mut self.sources);
                if announce {
                    self.emit_changed(&link.changed);
                }
                moved = true;
            }
        }
        moved
    }

    /// Advance the clock by `delta` seconds.
    pub fn tick(&mut self, delta: f64) -> bool {
        let elapsed = self.elapsed + delta;
        #[cfg(feature = "alloc_check")]
        let moved = assert_no_alloc::assert_no_alloc(|| self.advance(elapsed));
        #[cfg(not(feature = "alloc_check"))]
        let moved = self.advance(elapsed);
        moved
    }

    // --- Persistence ---

    /// Everything needed to rebuild this session.
    pub fn state(&self) -> SessionState {
        SessionState {
            mode: self.config.mode,
            sources: self.sources.clone(),
            position_policy: self.enforcer.position_policy(),
            elevation_policy: self.enforcer.elevation_policy(),
            snapshots: self.enforcer.snapshots().clone(),
            position_trajectory: self.position_driver.to_state(),
            elevation_trajectory: self.elevation_driver.to_state(),
        }
    }

    /// Replace the whole session state. Sources keep their stored values
    /// exactly; no setter logic runs.
    pub fn restore(&mut self, state: SessionState) {
        let mut sources = state.sources;
        self.config.mode = state.mode;
        if sources.len() > MAX_SOURCES {
            log::warn!("[session] {} sources stored, keeping {}", sources.len(), MAX_SOURCES);
            sources.truncate(MAX_SOURCES);
        }
        if sources.is_empty() {
            log::warn!("[session] no sources stored, using default layout");
            sources = default_layout(&self.config);
        }
        self.config.source_count = sources.len();
        self.sources = sources;

        self.enforcer
            .restore(state.position_policy, state.elevation_policy, state.snapshots);
        if self.enforcer.snapshots().len() != self.sources.len() {
            log::warn!(
                "[session] {} anchors for {} sources, recapturing",
                self.enforcer.snapshots().len(),
                self.sources.len()
            );
            self.enforcer.snapshot(&mut self.sources);
        }

        self.position_driver.restore(&state.position_trajectory);
        self.elevation_driver.restore(&state.elevation_trajectory);
        self.elapsed = 0.0;

        log::info!(
            "[session] restored {} sources, links {}/{}",
            self.sources.len(),
            self.enforcer.position_policy().name(),
            self.enforcer.elevation_policy().name()
        );
        self.emit_every();
    }

    pub fn save(&self) -> Result<Vec<u8>, FormatError> {
        sp_formats::save_state(&self.state())
    }

    pub fn load(&mut self, data: &[u8]) -> Result<(), FormatError> {
        let state = sp_formats::load_state(data)?;
        self.restore(state);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
