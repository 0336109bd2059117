//! Link policies and the anchor snapshots they are evaluated against.

use arrayvec::ArrayVec;

use crate::angle::Radians;
use crate::point::Point;
use crate::source::Source;

/// Maximum number of sources in a session.
pub const MAX_SOURCES: usize = 16;

// ── Policies ────────────────────────────────────────────────────────

/// How secondary sources follow the primary's position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PositionPolicy {
    #[default]
    Independent = 0,
    /// Rotate and scale along with the primary around the centre.
    Circular = 1,
    /// Rotate with the primary, keep the anchored radius.
    CircularFixedRadius = 2,
    /// Keep the anchored angle, follow the primary's radius change.
    CircularFixedAngle = 3,
    /// Stay on the anchor.
    CircularFullyFixed = 4,
    /// Translate by the primary's x/y delta.
    DeltaLock = 5,
    /// Mirror the primary across the vertical centre line.
    SymmetricX = 6,
    /// Mirror the primary across the horizontal centre line.
    SymmetricY = 7,
}

impl PositionPolicy {
    pub const ALL: [Self; 8] = [
        Self::Independent,
        Self::Circular,
        Self::CircularFixedRadius,
        Self::CircularFixedAngle,
        Self::CircularFullyFixed,
        Self::DeltaLock,
        Self::SymmetricX,
        Self::SymmetricY,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn is_linked(self) -> bool {
        self != Self::Independent
    }

    /// Secondary positions are fully dictated by the policy; a secondary
    /// cannot be moved on its own.
    pub fn is_rigid(self) -> bool {
        matches!(self, Self::CircularFullyFixed | Self::SymmetricX | Self::SymmetricY)
    }

    /// Result does not depend on the anchors at all.
    pub fn is_anchor_free(self) -> bool {
        matches!(self, Self::SymmetricX | Self::SymmetricY)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Circular => "circular",
            Self::CircularFixedRadius => "circular-fixed-radius",
            Self::CircularFixedAngle => "circular-fixed-angle",
            Self::CircularFullyFixed => "circular-fully-fixed",
            Self::DeltaLock => "delta-lock",
            Self::SymmetricX => "symmetric-x",
            Self::SymmetricY => "symmetric-y",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// How secondary sources follow the primary's elevation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElevationPolicy {
    #[default]
    Independent = 0,
    /// Same elevation as the primary.
    Equal = 1,
    /// Fan out from the primary up to the zenith.
    BottomTop = 2,
    /// Fan out from the primary down to the horizon.
    TopBottom = 3,
    /// Shift by the primary's elevation delta.
    DeltaLock = 4,
}

impl ElevationPolicy {
    pub const ALL: [Self; 5] =
        [Self::Independent, Self::Equal, Self::BottomTop, Self::TopBottom, Self::DeltaLock];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn is_linked(self) -> bool {
        self != Self::Independent
    }

    pub fn is_rigid(self) -> bool {
        matches!(self, Self::Equal | Self::BottomTop | Self::TopBottom)
    }

    pub fn is_anchor_free(self) -> bool {
        self.is_rigid()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Equal => "equal",
            Self::BottomTop => "bottom-top",
            Self::TopBottom => "top-bottom",
            Self::DeltaLock => "delta-lock",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

// ── Snapshots ───────────────────────────────────────────────────────

/// Anchor of one source as seen by the link strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SourceSnapshot {
    pub position: Point,
    pub elevation: Radians,
}

impl SourceSnapshot {
    pub fn of(source: &Source) -> Self {
        Self { position: source.position(), elevation: source.elevation() }
    }
}

/// Anchors of every source, captured together. Index 0 is the primary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourcesSnapshots {
    items: ArrayVec<SourceSnapshot, MAX_SOURCES>,
}

impl SourcesSnapshots {
    pub fn new() -> Self {
        Self { items: ArrayVec::new() }
    }

    /// Capture the current position of every source (up to `MAX_SOURCES`).
    pub fn capture(sources: &[Source]) -> Self {
        Self { items: sources.iter().take(MAX_SOURCES).map(SourceSnapshot::of).collect() }
    }

    pub fn from_snapshots(snapshots: &[SourceSnapshot]) -> Self {
        Self { items: snapshots.iter().take(MAX_SOURCES).copied().collect() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[SourceSnapshot] {
        &self.items
    }

    pub fn primary(&self) -> SourceSnapshot {
        self.items.first().copied().unwrap_or_default()
    }

    /// Snapshot at `index`. Out-of-range access is a caller bug.
    pub fn get(&self, index: usize) -> SourceSnapshot {
        debug_assert!(index < self.items.len(), "snapshot {} out of {}", index, self.items.len());
        self.items.get(index).copied().unwrap_or_default()
    }

    /// Grow by repeating the last snapshot, or truncate.
    pub fn resize(&mut self, count: usize) {
        let count = count.min(MAX_SOURCES);
        if count < self.items.len() {
            self.items.truncate(count);
            return;
        }
        let filler = self.items.last().copied().unwrap_or_default();
        while self.items.len() < count {
            self.items.push(filler);
        }
    }
}
