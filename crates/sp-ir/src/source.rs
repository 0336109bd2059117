//! A single spatialized source and its anchor snapshot.

use core::f32::consts::{FRAC_PI_2, TAU};

use crate::angle::{Normalized, Radians};
use crate::coords::{
    cube_to_point, dome_to_point, point_to_cube, point_to_dome, SpatMode, MAX_CUBE_DISTANCE,
};
use crate::point::{FieldPolar, Point, FIELD_CENTER};

/// User-visible source number.
pub type SourceId = u16;

/// Position captured when linking is engaged.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SourceAnchor {
    pub azimuth: Radians,
    pub elevation: Radians,
    pub distance: f32,
    pub position: Point,
}

/// Everything a listener needs to know about where a source now is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SourcePosition {
    pub position: Point,
    pub azimuth: Radians,
    pub elevation: Radians,
    pub distance: f32,
}

/// Plain field-for-field image of a `Source`, used to persist and restore
/// state without running any setter logic.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SourceFields {
    pub id: SourceId,
    pub mode: SpatMode,
    pub azimuth: Radians,
    pub elevation: Radians,
    pub elevation_unclipped: Radians,
    pub distance: f32,
    pub position: Point,
    pub azimuth_span: Normalized,
    pub elevation_span: Normalized,
    pub anchor: Option<SourceAnchor>,
}

/// One spatialized point.
///
/// Position (x/y) and azimuth/elevation/distance describe the same point;
/// every setter recomputes the other representation for the active mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    id: SourceId,
    mode: SpatMode,
    azimuth: Radians,
    elevation: Radians,
    /// Last requested elevation before clipping to [0°, 90°].
    elevation_unclipped: Radians,
    distance: f32,
    position: Point,
    azimuth_span: Normalized,
    elevation_span: Normalized,
    anchor: Option<SourceAnchor>,
}

impl Source {
    /// A source sitting on the field centre.
    pub fn new(id: SourceId, mode: SpatMode) -> Self {
        let elevation = match mode {
            SpatMode::Dome => Radians::QUARTER_TURN,
            SpatMode::Cube => Radians::ZERO,
        };
        Self {
            id,
            mode,
            azimuth: Radians::ZERO,
            elevation,
            elevation_unclipped: elevation,
            distance: 0.0,
            position: FIELD_CENTER,
            azimuth_span: Normalized::ZERO,
            elevation_span: Normalized::ZERO,
            anchor: None,
        }
    }

    /// Default layout: `count` sources spread evenly on a circle of
    /// `radius` (field units), source 0 at the top.
    pub fn evenly_spaced(index: usize, count: usize, radius: f32, mode: SpatMode) -> Self {
        let mut source = Self::new(index as SourceId + 1, mode);
        let step = TAU / count.max(1) as f32;
        let polar = FieldPolar {
            radius,
            angle: Radians(-FRAC_PI_2 - step * index as f32),
        };
        source.set_position(polar.to_point());
        source
    }

    // --- Accessors ---

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn set_id(&mut self, id: SourceId) {
        self.id = id;
    }

    pub fn mode(&self) -> SpatMode {
        self.mode
    }

    pub fn azimuth(&self) -> Radians {
        self.azimuth
    }

    pub fn elevation(&self) -> Radians {
        self.elevation
    }

    pub fn elevation_unclipped(&self) -> Radians {
        self.elevation_unclipped
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn azimuth_span(&self) -> Normalized {
        self.azimuth_span
    }

    pub fn elevation_span(&self) -> Normalized {
        self.elevation_span
    }

    pub fn anchor(&self) -> Option<&SourceAnchor> {
        self.anchor.as_ref()
    }

    pub fn current(&self) -> SourcePosition {
        SourcePosition {
            position: self.position,
            azimuth: self.azimuth,
            elevation: self.elevation,
            distance: self.distance,
        }
    }

    // --- Setters ---

    /// Switch spatialization mode, rebuilding x/y from the polar values.
    pub fn set_mode(&mut self, mode: SpatMode) {
        self.mode = mode;
        self.elevation = self.elevation.clamped(Radians::ZERO, Radians::QUARTER_TURN);
        self.update_position();
    }

    pub fn set_azimuth(&mut self, azimuth: Radians) {
        self.azimuth = azimuth.simplified();
        self.update_position();
    }

    /// Set elevation, clipping into [0°, 90°] and remembering the raw value.
    pub fn set_elevation(&mut self, elevation: Radians) {
        self.elevation_unclipped = elevation;
        self.elevation = elevation.clamped(Radians::ZERO, Radians::QUARTER_TURN);
        self.update_position();
    }

    /// Re-apply the remembered unclipped elevation (after bounds changed).
    pub fn restore_unclipped_elevation(&mut self) {
        self.set_elevation(self.elevation_unclipped);
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(0.0, MAX_CUBE_DISTANCE);
        self.update_position();
    }

    pub fn set_x(&mut self, x: f32) {
        self.set_position(Point::new(x, self.position.y));
    }

    pub fn set_y(&mut self, y: f32) {
        self.set_position(Point::new(self.position.x, y));
    }

    /// Move to a field position (clamped to the unit square).
    pub fn set_position(&mut self, position: Point) {
        self.position = position.clamped_to_field();
        self.update_polar();
    }

    pub fn set_azimuth_span(&mut self, span: Normalized) {
        self.azimuth_span = span;
    }

    pub fn set_elevation_span(&mut self, span: Normalized) {
        self.elevation_span = span;
    }

    pub fn normalized_azimuth(&self) -> Normalized {
        self.azimuth.to_normalized_azimuth()
    }

    pub fn set_normalized_azimuth(&mut self, value: Normalized) {
        self.set_azimuth(Radians::from_normalized_azimuth(value));
    }

    pub fn normalized_elevation(&self) -> Normalized {
        self.elevation.to_normalized_elevation()
    }

    pub fn set_normalized_elevation(&mut self, value: Normalized) {
        self.set_elevation(Radians::from_normalized_elevation(value));
    }

    // --- Anchor ---

    /// Capture (`true`) or drop (`false`) the anchor snapshot.
    pub fn fix_position(&mut self, should_fix: bool) {
        self.anchor = should_fix.then(|| self.snapshot_anchor());
    }

    /// Rebuild the absolute position as anchor + polar delta, then clamp.
    ///
    /// Without an anchor the current position is used as one.
    pub fn set_from_fixed_source(
        &mut self,
        delta_azimuth: Radians,
        delta_elevation: Radians,
        delta_distance: f32,
    ) {
        let anchor = self.anchor.unwrap_or_else(|| self.snapshot_anchor());
        self.azimuth = (anchor.azimuth + delta_azimuth).simplified();
        self.elevation_unclipped = anchor.elevation + delta_elevation;
        self.elevation = self
            .elevation_unclipped
            .clamped(Radians::ZERO, Radians::QUARTER_TURN);
        self.distance = (anchor.distance + delta_distance).clamp(0.0, MAX_CUBE_DISTANCE);
        self.update_position();
    }

    /// Rebuild the absolute position as anchor + x/y delta, then clamp.
    pub fn set_xy_from_fixed_source(&mut self, delta_x: f32, delta_y: f32) {
        let anchor = self.anchor.unwrap_or_else(|| self.snapshot_anchor());
        self.set_position(anchor.position + Point::new(delta_x, delta_y));
    }

    /// Mirror `primary` across the vertical centre line.
    pub fn set_symmetric_x(&mut self, primary: Point) {
        self.set_position(primary.mirrored_x());
    }

    /// Mirror `primary` across the horizontal centre line.
    pub fn set_symmetric_y(&mut self, primary: Point) {
        self.set_position(primary.mirrored_y());
    }

    // --- Internal ---

    fn snapshot_anchor(&self) -> SourceAnchor {
        SourceAnchor {
            azimuth: self.azimuth,
            elevation: self.elevation,
            distance: self.distance,
            position: self.position,
        }
    }

    fn update_position(&mut self) {
        match self.mode {
            SpatMode::Dome => {
                self.position = dome_to_point(self.azimuth, self.elevation);
            }
            SpatMode::Cube => {
                let raw = cube_to_point(self.azimuth, self.distance);
                let clamped = raw.clamped_to_field();
                self.position = clamped;
                if clamped != raw {
                    // Past a field edge: re-derive so both views agree.
                    self.update_polar();
                }
            }
        }
    }

    fn update_polar(&mut self) {
        match self.mode {
            SpatMode::Dome => {
                let (azimuth, elevation) = point_to_dome(self.position, self.azimuth);
                self.azimuth = azimuth;
                self.elevation = elevation;
                self.elevation_unclipped = elevation;
            }
            SpatMode::Cube => {
                let (azimuth, distance) = point_to_cube(self.position, self.azimuth);
                self.azimuth = azimuth;
                self.distance = distance;
            }
        }
    }
}

impl From<&Source> for SourceFields {
    fn from(s: &Source) -> Self {
        Self {
            id: s.id,
            mode: s.mode,
            azimuth: s.azimuth,
            elevation: s.elevation,
            elevation_unclipped: s.elevation_unclipped,
            distance: s.distance,
            position: s.position,
            azimuth_span: s.azimuth_span,
            elevation_span: s.elevation_span,
            anchor: s.anchor,
        }
    }
}

impl From<SourceFields> for Source {
    fn from(f: SourceFields) -> Self {
        Self {
            id: f.id,
            mode: f.mode,
            azimuth: f.azimuth,
            elevation: f.elevation,
            elevation_unclipped: f.elevation_unclipped,
            distance: f.distance,
            position: f.position,
            azimuth_span: f.azimuth_span,
            elevation_span: f.elevation_span,
            anchor: f.anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::Degrees;

    fn deg(d: f32) -> Radians {
        Degrees(d).into()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn dome_source_starts_at_zenith() {
        let s = Source::new(1, SpatMode::Dome);
        assert_eq!(s.position(), FIELD_CENTER);
        assert!(close(s.elevation().0, FRAC_PI_2));
        assert!(s.anchor().is_none());
    }

    #[test]
    fn setting_azimuth_moves_position() {
        let mut s = Source::new(1, SpatMode::Dome);
        s.set_elevation(Radians::ZERO);
        s.set_azimuth(deg(90.0));
        assert!(close(s.x(), 0.0));
        assert!(close(s.y(), 0.5));
    }

    #[test]
    fn setting_position_recomputes_polar() {
        let mut s = Source::new(1, SpatMode::Dome);
        s.set_position(Point::new(0.5, 0.25));
        assert!(close(s.azimuth().0, 0.0));
        assert!(close(s.elevation().to_degrees().0, 45.0));
    }

    #[test]
    fn elevation_is_clipped_but_remembered() {
        let mut s = Source::new(1, SpatMode::Cube);
        s.set_elevation(deg(120.0));
        assert!(close(s.elevation().to_degrees().0, 90.0));
        assert!(close(s.elevation_unclipped().to_degrees().0, 120.0));
        s.set_elevation(deg(-10.0));
        assert_eq!(s.elevation(), Radians::ZERO);
    }

    #[test]
    fn xy_is_clamped() {
        let mut s = Source::new(1, SpatMode::Cube);
        s.set_position(Point::new(1.4, -0.3));
        assert_eq!(s.position(), Point::new(1.0, 0.0));
    }

    #[test]
    fn cube_distance_drives_radius() {
        let mut s = Source::new(1, SpatMode::Cube);
        s.set_azimuth(deg(180.0));
        s.set_distance(0.5);
        assert!(close(s.x(), 0.5));
        assert!(close(s.y(), 0.75));
    }

    #[test]
    fn cube_distance_past_edge_is_rederived() {
        let mut s = Source::new(1, SpatMode::Cube);
        s.set_distance(1.4);
        assert!(close(s.y(), 0.0));
        assert!(close(s.distance(), 1.0));
    }

    #[test]
    fn fix_position_captures_and_clears_anchor() {
        let mut s = Source::evenly_spaced(0, 4, 0.3, SpatMode::Dome);
        s.fix_position(true);
        let anchor = *s.anchor().unwrap();
        assert_eq!(anchor.position, s.position());
        s.fix_position(false);
        assert!(s.anchor().is_none());
    }

    #[test]
    fn set_from_fixed_source_adds_delta_to_anchor() {
        let mut s = Source::new(1, SpatMode::Dome);
        s.set_azimuth(deg(10.0));
        s.set_elevation(deg(30.0));
        s.fix_position(true);
        s.set_azimuth(deg(-100.0));

        s.set_from_fixed_source(deg(20.0), deg(80.0), 0.0);
        assert!(close(s.azimuth().to_degrees().0, 30.0));
        // 30 + 80 clipped to 90
        assert!(close(s.elevation().to_degrees().0, 90.0));
        assert!(close(s.elevation_unclipped().to_degrees().0, 110.0));
    }

    #[test]
    fn set_xy_from_fixed_source_clamps() {
        let mut s = Source::new(1, SpatMode::Cube);
        s.set_position(Point::new(0.8, 0.5));
        s.fix_position(true);
        s.set_xy_from_fixed_source(0.5, 0.1);
        assert!(close(s.x(), 1.0));
        assert!(close(s.y(), 0.6));
    }

    #[test]
    fn symmetric_setters_mirror_primary() {
        let mut s = Source::new(2, SpatMode::Cube);
        s.set_symmetric_x(Point::new(0.2, 0.7));
        assert!(close(s.x(), 0.8) && close(s.y(), 0.7));
        s.set_symmetric_y(Point::new(0.2, 0.7));
        assert!(close(s.x(), 0.2) && close(s.y(), 0.3));
    }

    #[test]
    fn evenly_spaced_puts_first_source_at_top() {
        let s = Source::evenly_spaced(0, 4, 0.4, SpatMode::Dome);
        assert!(close(s.x(), 0.5));
        assert!(close(s.y(), 0.1));
        assert!(close(s.azimuth().0, 0.0));
    }

    #[test]
    fn fields_round_trip_exactly() {
        let mut s = Source::evenly_spaced(2, 5, 0.35, SpatMode::Cube);
        s.set_elevation(deg(33.3));
        s.fix_position(true);
        let restored = Source::from(SourceFields::from(&s));
        assert_eq!(restored, s);
    }

    #[test]
    fn normalized_azimuth_setter() {
        let mut s = Source::new(1, SpatMode::Dome);
        s.set_normalized_azimuth(Normalized::new(0.75));
        assert!(close(s.azimuth().to_degrees().0, -90.0));
    }
}
