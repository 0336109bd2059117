//! Keeps linked sources consistent with the primary.
//!
//! The enforcer owns the anchor snapshots and the selected strategies.
//! Sources stay with the caller and are passed in on every call, so the
//! same enforcer can be driven from a session, a test, or a benchmark.

use heapless::Vec as FixedVec;
use sp_ir::{
    ElevationPolicy, PositionPolicy, Source, SourcesSnapshots, SpatMode, MAX_SOURCES,
};

use crate::strategy::{
    elevation_transform, position_transform, ElevationDelta, ElevationTransform, PositionTransform,
    PrimaryDelta,
};

/// Index of the source that drives the others.
pub const PRIMARY: usize = 0;

/// Indices of sources whose position changed during one call.
pub type ChangedSources = FixedVec<usize, MAX_SOURCES>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkState {
    #[default]
    Unlinked,
    Linked,
    /// Applying strategy results; only observable from inside a call.
    Propagating,
}

/// What happened to a reported move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No link policy; nothing else moved.
    Unlinked,
    /// Primary moved; secondaries were recomputed.
    Propagated,
    /// A secondary moved under a flexible policy; anchors were recaptured.
    Resnapshotted,
    /// A secondary moved under a rigid policy and was put back.
    Rejected,
}

/// Result of reporting a move to the enforcer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkOutcome {
    pub outcome: MoveOutcome,
    /// Sources (other than the mover) whose position was rewritten.
    pub changed: ChangedSources,
}

impl LinkOutcome {
    fn new(outcome: MoveOutcome) -> Self {
        Self { outcome, changed: ChangedSources::new() }
    }
}

pub struct SourceLinkEnforcer {
    position_policy: PositionPolicy,
    elevation_policy: ElevationPolicy,
    position_fn: PositionTransform,
    elevation_fn: ElevationTransform,
    snapshots: SourcesSnapshots,
    state: LinkState,
}

impl Default for SourceLinkEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLinkEnforcer {
    pub fn new() -> Self {
        Self {
            position_policy: PositionPolicy::Independent,
            elevation_policy: ElevationPolicy::Independent,
            position_fn: position_transform(PositionPolicy::Independent),
            elevation_fn: elevation_transform(ElevationPolicy::Independent),
            snapshots: SourcesSnapshots::new(),
            state: LinkState::Unlinked,
        }
    }

    pub fn position_policy(&self) -> PositionPolicy {
        self.position_policy
    }

    pub fn elevation_policy(&self) -> ElevationPolicy {
        self.elevation_policy
    }

    pub fn snapshots(&self) -> &SourcesSnapshots {
        &self.snapshots
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    // ── Configuration ───────────────────────────────────────────────

    /// Switch position policy. Always re-snapshots; anchor-free policies
    /// are applied right away.
    pub fn set_position_policy(
        &mut self,
        policy: PositionPolicy,
        sources: &mut [Source],
    ) -> ChangedSources {
        log::trace!("[link] position policy {} -> {}", self.position_policy.name(), policy.name());
        self.position_policy = policy;
        self.position_fn = position_transform(policy);
        self.snapshot(sources);
        if policy.is_anchor_free() {
            self.propagate_position(sources)
        } else {
            ChangedSources::new()
        }
    }

    /// Switch elevation policy. Same rules as `set_position_policy`.
    pub fn set_elevation_policy(
        &mut self,
        policy: ElevationPolicy,
        sources: &mut [Source],
    ) -> ChangedSources {
        log::trace!(
            "[link] elevation policy {} -> {}",
            self.elevation_policy.name(),
            policy.name()
        );
        self.elevation_policy = policy;
        self.elevation_fn = elevation_transform(policy);
        self.snapshot(sources);
        if policy.is_anchor_free() && elevation_applies(sources) {
            self.propagate_elevation(sources)
        } else {
            ChangedSources::new()
        }
    }

    /// Capture every source's current position as its anchor.
    pub fn snapshot(&mut self, sources: &mut [Source]) {
        let linked = self.is_linked();
        for source in sources.iter_mut() {
            source.fix_position(linked);
        }
        self.snapshots = SourcesSnapshots::capture(sources);
        self.state = if linked { LinkState::Linked } else { LinkState::Unlinked };
        log::trace!("[link] snapshot of {} sources", self.snapshots.len());
    }

    /// Follow a source-count change: grow by repeating the last
    /// snapshot, or truncate.
    pub fn set_source_count(&mut self, count: usize) {
        self.snapshots.resize(count);
    }

    /// Install previously persisted anchors as-is.
    pub fn restore(
        &mut self,
        position_policy: PositionPolicy,
        elevation_policy: ElevationPolicy,
        snapshots: SourcesSnapshots,
    ) {
        self.position_policy = position_policy;
        self.elevation_policy = elevation_policy;
        self.position_fn = position_transform(position_policy);
        self.elevation_fn = elevation_transform(elevation_policy);
        self.snapshots = snapshots;
        self.state = if self.is_linked() { LinkState::Linked } else { LinkState::Unlinked };
    }

    fn is_linked(&self) -> bool {
        self.position_policy.is_linked() || self.elevation_policy.is_linked()
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Source `index` was moved in x/y. Returns which other sources the
    /// policy rewrote.
    pub fn source_moved(&mut self, index: usize, sources: &mut [Source]) -> LinkOutcome {
        debug_assert!(index < sources.len(), "source {} out of {}", index, sources.len());
        if !self.position_policy.is_linked() {
            return LinkOutcome::new(MoveOutcome::Unlinked);
        }
        if index == PRIMARY {
            let changed = self.propagate_position(sources);
            return LinkOutcome { outcome: MoveOutcome::Propagated, changed };
        }
        if self.position_policy.is_rigid() {
            self.reclamp_position(index, sources);
            return LinkOutcome::new(MoveOutcome::Rejected);
        }
        self.snapshot(sources);
        LinkOutcome::new(MoveOutcome::Resnapshotted)
    }

    /// Source `index` changed elevation (cube mode).
    pub fn elevation_moved(&mut self, index: usize, sources: &mut [Source]) -> LinkOutcome {
        debug_assert!(index < sources.len(), "source {} out of {}", index, sources.len());
        if !self.elevation_policy.is_linked() || !elevation_applies(sources) {
            return LinkOutcome::new(MoveOutcome::Unlinked);
        }
        if index == PRIMARY {
            let changed = self.propagate_elevation(sources);
            return LinkOutcome { outcome: MoveOutcome::Propagated, changed };
        }
        if self.elevation_policy.is_rigid() {
            self.reclamp_elevation(index, sources);
            return LinkOutcome::new(MoveOutcome::Rejected);
        }
        self.snapshot(sources);
        LinkOutcome::new(MoveOutcome::Resnapshotted)
    }

    // ── Propagation ─────────────────────────────────────────────────

    fn primary_delta(&self, sources: &[Source]) -> PrimaryDelta {
        PrimaryDelta {
            anchor: self.snapshots.primary().position,
            current: sources[PRIMARY].position(),
        }
    }

    fn elevation_delta(&self, sources: &[Source]) -> ElevationDelta {
        ElevationDelta {
            anchor: self.snapshots.primary().elevation,
            current: sources[PRIMARY].elevation(),
        }
    }

    fn linked_count(&self, sources: &[Source]) -> usize {
        self.snapshots.len().min(sources.len())
    }

    fn propagate_position(&mut self, sources: &mut [Source]) -> ChangedSources {
        let mut changed = ChangedSources::new();
        if sources.is_empty() {
            return changed;
        }
        self.state = LinkState::Propagating;
        let delta = self.primary_delta(sources);
        for index in 1..self.linked_count(sources) {
            if let Some(target) = (self.position_fn)(&self.snapshots, &delta, index) {
                let source = &mut sources[index];
                let before = source.position();
                source.set_position(target);
                if source.position() != before {
                    let _ = changed.push(index);
                }
            }
        }
        self.state = LinkState::Linked;
        changed
    }

    fn propagate_elevation(&mut self, sources: &mut [Source]) -> ChangedSources {
        let mut changed = ChangedSources::new();
        if sources.is_empty() {
            return changed;
        }
        self.state = LinkState::Propagating;
        let delta = self.elevation_delta(sources);
        for index in 1..self.linked_count(sources) {
            if let Some(target) = (self.elevation_fn)(&self.snapshots, &delta, index) {
                let source = &mut sources[index];
                let before = source.elevation();
                source.set_elevation(target);
                if source.elevation() != before {
                    let _ = changed.push(index);
                }
            }
        }
        self.state = LinkState::Linked;
        changed
    }

    fn reclamp_position(&self, index: usize, sources: &mut [Source]) {
        if index >= self.linked_count(sources) {
            return;
        }
        let delta = self.primary_delta(sources);
        if let Some(target) = (self.position_fn)(&self.snapshots, &delta, index) {
            sources[index].set_position(target);
        }
    }

    fn reclamp_elevation(&self, index: usize, sources: &mut [Source]) {
        if index >= self.linked_count(sources) {
            return;
        }
        let delta = self.elevation_delta(sources);
        if let Some(target) = (self.elevation_fn)(&self.snapshots, &delta, index) {
            sources[index].set_elevation(target);
        }
    }
}

/// Elevation links only drive cube-mode sources; in dome mode elevation
/// is part of the linked position.
fn elevation_applies(sources: &[Source]) -> bool {
    sources.first().map(|s| s.mode()) == Some(SpatMode::Cube)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use sp_ir::{Degrees, FieldPolar, Point, Radians};

    fn polar(radius: f32, deg: f32) -> Point {
        FieldPolar { radius, angle: Degrees(deg).into() }.to_point()
    }

    fn sources_at(points: &[Point], mode: SpatMode) -> Vec<Source> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut s = Source::new(i as u16 + 1, mode);
                s.set_position(*p);
                s
            })
            .collect()
    }

    fn ring(count: usize, mode: SpatMode) -> Vec<Source> {
        (0..count).map(|i| Source::evenly_spaced(i, count, 0.35, mode)).collect()
    }

    #[test]
    fn independent_leaves_secondaries_alone() {
        let mut sources = ring(4, SpatMode::Dome);
        let before: Vec<Point> = sources.iter().map(|s| s.position()).collect();
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.snapshot(&mut sources);
        sources[0].set_position(Point::new(0.1, 0.1));
        let result = enforcer.source_moved(0, &mut sources);
        assert_eq!(result.outcome, MoveOutcome::Unlinked);
        assert!(result.changed.is_empty());
        for i in 1..4 {
            assert_eq!(sources[i].position(), before[i]);
        }
        assert_eq!(enforcer.state(), LinkState::Unlinked);
    }

    #[test]
    fn circular_rotates_secondary_by_primary_delta() {
        let mut sources = sources_at(&[polar(0.4, 30.0), polar(0.4, 120.0)], SpatMode::Cube);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::Circular, &mut sources);
        assert_eq!(enforcer.state(), LinkState::Linked);

        sources[0].set_position(polar(0.4, 60.0));
        let result = enforcer.source_moved(0, &mut sources);
        assert_eq!(result.outcome, MoveOutcome::Propagated);
        assert_eq!(result.changed.as_slice(), &[1]);

        let got = FieldPolar::of(sources[1].position());
        assert!((got.radius - 0.4).abs() < 1e-4);
        let want: Radians = Degrees(150.0).into();
        assert!((got.angle - want).simplified().0.abs() < 1e-4);
    }

    #[test]
    fn primary_event_is_idempotent() {
        let mut sources = ring(5, SpatMode::Dome);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::DeltaLock, &mut sources);
        sources[0].set_position(Point::new(0.55, 0.3));

        enforcer.source_moved(0, &mut sources);
        let first: Vec<Point> = sources.iter().map(|s| s.position()).collect();
        let again = enforcer.source_moved(0, &mut sources);
        let second: Vec<Point> = sources.iter().map(|s| s.position()).collect();
        assert_eq!(first, second);
        assert!(again.changed.is_empty());
    }

    #[test]
    fn result_depends_only_on_total_delta() {
        let mut direct = ring(3, SpatMode::Cube);
        let mut stepped = direct.clone();
        let mut a = SourceLinkEnforcer::new();
        let mut b = SourceLinkEnforcer::new();
        a.set_position_policy(PositionPolicy::Circular, &mut direct);
        b.set_position_policy(PositionPolicy::Circular, &mut stepped);

        direct[0].set_position(polar(0.2, 10.0));
        a.source_moved(0, &mut direct);

        for p in [polar(0.3, 80.0), polar(0.45, -120.0), polar(0.2, 10.0)] {
            stepped[0].set_position(p);
            b.source_moved(0, &mut stepped);
        }
        for i in 1..3 {
            assert!(direct[i].position().distance(stepped[i].position()) < 1e-5);
        }
    }

    #[test]
    fn symmetric_applies_on_activation() {
        let mut sources = sources_at(&[Point::new(0.2, 0.3), Point::new(0.9, 0.9)], SpatMode::Cube);
        let mut enforcer = SourceLinkEnforcer::new();
        let changed = enforcer.set_position_policy(PositionPolicy::SymmetricX, &mut sources);
        assert_eq!(changed.as_slice(), &[1]);
        assert!(sources[1].position().distance(Point::new(0.8, 0.3)) < 1e-6);
    }

    #[test]
    fn rigid_policy_rejects_secondary_move() {
        let mut sources = sources_at(&[Point::new(0.2, 0.3), Point::new(0.9, 0.9)], SpatMode::Cube);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::SymmetricY, &mut sources);
        sources[1].set_position(Point::new(0.1, 0.1));
        let result = enforcer.source_moved(1, &mut sources);
        assert_eq!(result.outcome, MoveOutcome::Rejected);
        assert!(sources[1].position().distance(Point::new(0.2, 0.7)) < 1e-6);
    }

    #[test]
    fn flexible_policy_resnapshots_secondary_move() {
        let mut sources = ring(3, SpatMode::Cube);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::DeltaLock, &mut sources);
        sources[2].set_position(Point::new(0.7, 0.7));
        let result = enforcer.source_moved(2, &mut sources);
        assert_eq!(result.outcome, MoveOutcome::Resnapshotted);
        assert_eq!(enforcer.snapshots().get(2).position, Point::new(0.7, 0.7));
        assert_eq!(sources[2].anchor().map(|a| a.position), Some(Point::new(0.7, 0.7)));
    }

    #[test]
    fn switching_policy_resnapshots() {
        let mut sources = ring(3, SpatMode::Dome);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::Circular, &mut sources);
        sources[0].set_position(Point::new(0.5, 0.3));
        enforcer.source_moved(0, &mut sources);
        enforcer.set_position_policy(PositionPolicy::DeltaLock, &mut sources);
        for (i, s) in sources.iter().enumerate() {
            assert_eq!(enforcer.snapshots().get(i).position, s.position());
        }
    }

    #[test]
    fn unlinking_drops_anchors() {
        let mut sources = ring(2, SpatMode::Dome);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::Circular, &mut sources);
        assert!(sources[1].anchor().is_some());
        enforcer.set_position_policy(PositionPolicy::Independent, &mut sources);
        assert!(sources[1].anchor().is_none());
        assert_eq!(enforcer.state(), LinkState::Unlinked);
    }

    #[test]
    fn source_count_change_resizes_snapshots() {
        let mut sources = ring(3, SpatMode::Dome);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_position_policy(PositionPolicy::Circular, &mut sources);
        enforcer.set_source_count(5);
        assert_eq!(enforcer.snapshots().len(), 5);
        assert_eq!(enforcer.snapshots().get(4), enforcer.snapshots().get(2));
        enforcer.set_source_count(2);
        assert_eq!(enforcer.snapshots().len(), 2);
    }

    #[test]
    fn elevation_equal_follows_primary_in_cube_mode() {
        let mut sources = ring(3, SpatMode::Cube);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_elevation_policy(ElevationPolicy::Equal, &mut sources);
        sources[0].set_elevation(Degrees(40.0).into());
        let result = enforcer.elevation_moved(0, &mut sources);
        assert_eq!(result.outcome, MoveOutcome::Propagated);
        assert_eq!(result.changed.len(), 2);
        for s in &sources[1..] {
            assert!((s.elevation().to_degrees().0 - 40.0).abs() < 1e-4);
        }

        sources[2].set_elevation(Degrees(10.0).into());
        let rejected = enforcer.elevation_moved(2, &mut sources);
        assert_eq!(rejected.outcome, MoveOutcome::Rejected);
        assert!((sources[2].elevation().to_degrees().0 - 40.0).abs() < 1e-4);
    }

    #[test]
    fn elevation_policy_is_inert_in_dome_mode() {
        let mut sources = ring(3, SpatMode::Dome);
        let mut enforcer = SourceLinkEnforcer::new();
        enforcer.set_elevation_policy(ElevationPolicy::Equal, &mut sources);
        let result = enforcer.elevation_moved(0, &mut sources);
        assert_eq!(result.outcome, MoveOutcome::Unlinked);
    }
}
