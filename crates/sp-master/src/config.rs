//! Session construction parameters.

use sp_ir::{SpatMode, DEFAULT_CYCLE_DURATION, MAX_SOURCES};

/// Default host tick rate in Hz.
pub const DEFAULT_TICK_RATE: u32 = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub mode: SpatMode,
    /// Number of sources, clamped to `1..=MAX_SOURCES`.
    pub source_count: usize,
    /// Radius (field units) of the default source circle.
    pub layout_radius: f32,
    /// Ticks per second the host is expected to drive `tick` at.
    pub tick_rate: u32,
    /// Initial seconds per trajectory cycle.
    pub cycle_duration: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SpatMode::Dome,
            source_count: 2,
            layout_radius: 0.35,
            tick_rate: DEFAULT_TICK_RATE,
            cycle_duration: DEFAULT_CYCLE_DURATION,
        }
    }
}

impl SessionConfig {
    pub fn clamped_source_count(&self) -> usize {
        self.source_count.clamp(1, MAX_SOURCES)
    }

    /// Seconds between two ticks.
    pub fn tick_interval(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }
}
