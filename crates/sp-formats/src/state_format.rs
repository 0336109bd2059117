//! Session state container.
//!
//! Layout: `SPTM` magic, format version, then a directory of
//! `(name, offset, size)` entries pointing at fixed little-endian
//! sections. Floats are stored as raw IEEE-754 bits.
//!
//! | Section | Contents                                   |
//! |---------|--------------------------------------------|
//! | `HEAD`  | mode, position policy, elevation policy     |
//! | `SRCS`  | every source field, anchor included        |
//! | `SNAP`  | link anchor snapshots                      |
//! | `PTRJ`  | position trajectory settings and waypoints |
//! | `ETRJ`  | elevation trajectory settings and waypoints|

use std::io::{Cursor, Seek, Write};

use binrw::{binrw, BinRead, BinWrite, Endian};
use sp_ir::{
    ElevationPolicy, ElevationShape, Normalized, Point, PositionPolicy, Radians, SessionState,
    Source, SourceAnchor, SourceFields, SourceSnapshot, SourcesSnapshots, SpatMode,
    TrajectoryKind, TrajectoryShape, TrajectoryState, WaypointPath, DEFAULT_CYCLE_DURATION,
    MAX_SOURCES,
};

use crate::FormatError;

/// Current container version. Older versions load; newer ones are refused.
pub const FORMAT_VERSION: u16 = 1;

const MAGIC: &[u8; 4] = b"SPTM";
const MAX_SECTIONS: u32 = 64;
const MAX_WAYPOINTS: u32 = 1 << 20;

/// Magic + version + section count.
const HEADER_FIXED_SIZE: usize = 4 + 2 + 4;
const SECTION_ENTRY_SIZE: usize = 12;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[binrw]
#[brw(little, magic = b"SPTM")]
#[derive(Debug)]
struct FileHeader {
    version: u16,
    #[br(temp, assert(section_count <= MAX_SECTIONS))]
    #[bw(calc = sections.len() as u32)]
    section_count: u32,
    #[br(count = section_count)]
    sections: Vec<SectionEntry>,
}

#[binrw]
#[brw(little)]
#[derive(Clone, Copy, Debug)]
struct SectionEntry {
    name: [u8; 4],
    offset: u32,
    size: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug)]
struct HeadRecord {
    mode: u8,
    position_policy: u8,
    elevation_policy: u8,
}

#[binrw]
#[brw(little)]
#[derive(Debug)]
struct SourceRecord {
    id: u16,
    mode: u8,
    azimuth: f32,
    elevation: f32,
    elevation_unclipped: f32,
    distance: f32,
    x: f32,
    y: f32,
    azimuth_span: f32,
    elevation_span: f32,
    has_anchor: u8,
    anchor_azimuth: f32,
    anchor_elevation: f32,
    anchor_distance: f32,
    anchor_x: f32,
    anchor_y: f32,
}

#[binrw]
#[brw(little)]
#[derive(Debug)]
struct SourcesRecord {
    #[br(temp, assert(count as usize <= MAX_SOURCES))]
    #[bw(calc = sources.len() as u32)]
    count: u32,
    #[br(count = count)]
    sources: Vec<SourceRecord>,
}

#[binrw]
#[brw(little)]
#[derive(Debug)]
struct SnapshotRecord {
    x: f32,
    y: f32,
    elevation: f32,
}

#[binrw]
#[brw(little)]
#[derive(Debug)]
struct SnapshotsRecord {
    #[br(temp, assert(count as usize <= MAX_SOURCES))]
    #[bw(calc = items.len() as u32)]
    count: u32,
    #[br(count = count)]
    items: Vec<SnapshotRecord>,
}

#[binrw]
#[brw(little)]
#[derive(Clone, Copy, Debug)]
struct PointRecord {
    x: f32,
    y: f32,
}

#[binrw]
#[brw(little)]
#[derive(Debug)]
struct TrajectoryRecord {
    shape: u8,
    back_and_forth: u8,
    active: u8,
    duration: f64,
    deviation_per_cycle: f32,
    damping_cycles: u32,
    #[br(temp, assert(count <= MAX_WAYPOINTS))]
    #[bw(calc = points.len() as u32)]
    count: u32,
    #[br(count = count)]
    points: Vec<PointRecord>,
}

// ---------------------------------------------------------------------------
// State -> records
// ---------------------------------------------------------------------------

impl HeadRecord {
    fn of(state: &SessionState) -> Self {
        Self {
            mode: state.mode as u8,
            position_policy: state.position_policy as u8,
            elevation_policy: state.elevation_policy as u8,
        }
    }
}

impl SourceRecord {
    fn of(source: &Source) -> Self {
        let f = SourceFields::from(source);
        let anchor = f.anchor.unwrap_or_default();
        Self {
            id: f.id,
            mode: f.mode as u8,
            azimuth: f.azimuth.0,
            elevation: f.elevation.0,
            elevation_unclipped: f.elevation_unclipped.0,
            distance: f.distance,
            x: f.position.x,
            y: f.position.y,
            azimuth_span: f.azimuth_span.get(),
            elevation_span: f.elevation_span.get(),
            has_anchor: f.anchor.is_some() as u8,
            anchor_azimuth: anchor.azimuth.0,
            anchor_elevation: anchor.elevation.0,
            anchor_distance: anchor.distance,
            anchor_x: anchor.position.x,
            anchor_y: anchor.position.y,
        }
    }

    fn to_source(&self, fallback_mode: SpatMode) -> Source {
        let mode = SpatMode::from_u8(self.mode).unwrap_or_else(|| {
            log::warn!(
                "[state] source {} mode {} out of range, using session mode",
                self.id,
                self.mode
            );
            fallback_mode
        });
        let anchor = (self.has_anchor != 0).then(|| SourceAnchor {
            azimuth: Radians(self.anchor_azimuth),
            elevation: Radians(self.anchor_elevation),
            distance: self.anchor_distance,
            position: Point::new(self.anchor_x, self.anchor_y),
        });
        Source::from(SourceFields {
            id: self.id,
            mode,
            azimuth: Radians(self.azimuth),
            elevation: Radians(self.elevation),
            elevation_unclipped: Radians(self.elevation_unclipped),
            distance: self.distance,
            position: Point::new(self.x, self.y),
            azimuth_span: Normalized::new(self.azimuth_span),
            elevation_span: Normalized::new(self.elevation_span),
            anchor,
        })
    }
}

impl SnapshotsRecord {
    fn of(snapshots: &SourcesSnapshots) -> Self {
        let items = snapshots
            .as_slice()
            .iter()
            .map(|s| SnapshotRecord { x: s.position.x, y: s.position.y, elevation: s.elevation.0 })
            .collect();
        Self { items }
    }

    fn to_snapshots(&self) -> SourcesSnapshots {
        let items: Vec<SourceSnapshot> = self
            .items
            .iter()
            .map(|r| SourceSnapshot {
                position: Point::new(r.x, r.y),
                elevation: Radians(r.elevation),
            })
            .collect();
        SourcesSnapshots::from_snapshots(&items)
    }
}

impl TrajectoryRecord {
    fn of(state: &TrajectoryState) -> Self {
        let shape = match state.kind {
            TrajectoryKind::Position(shape) => shape as u8,
            TrajectoryKind::Elevation(shape) => shape as u8,
        };
        Self {
            shape,
            back_and_forth: state.back_and_forth as u8,
            active: state.active as u8,
            duration: state.duration,
            deviation_per_cycle: state.deviation_per_cycle.0,
            damping_cycles: state.damping_cycles,
            points: state.path.points().iter().map(|p| PointRecord { x: p.x, y: p.y }).collect(),
        }
    }

    fn to_state(&self, elevation: bool) -> TrajectoryState {
        let kind = if elevation {
            let shape = ElevationShape::from_u8(self.shape);
            TrajectoryKind::Elevation(or_default(shape, "elevation shape", self.shape))
        } else {
            let shape = TrajectoryShape::from_u8(self.shape);
            TrajectoryKind::Position(or_default(shape, "position shape", self.shape))
        };
        let duration = if self.duration.is_finite() {
            self.duration
        } else {
            log::warn!("[state] cycle duration {} is not finite, using default", self.duration);
            DEFAULT_CYCLE_DURATION
        };
        let points = self.points.iter().map(|p| Point::new(p.x, p.y)).collect();
        let path = WaypointPath::from_points(points);
        TrajectoryState {
            kind,
            path,
            duration,
            back_and_forth: self.back_and_forth != 0,
            deviation_per_cycle: Radians(self.deviation_per_cycle),
            damping_cycles: self.damping_cycles,
            active: self.active != 0,
        }
    }
}

fn or_default<T: Default>(value: Option<T>, field: &str, raw: u8) -> T {
    value.unwrap_or_else(|| {
        log::warn!("[state] {} {} out of range, using default", field, raw);
        T::default()
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn encode<T>(record: &T) -> Result<Vec<u8>, FormatError>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(Vec::new());
    record.write_options(&mut cursor, Endian::Little, ())?;
    Ok(cursor.into_inner())
}

/// Serialize `state` into a new buffer.
pub fn save_state(state: &SessionState) -> Result<Vec<u8>, FormatError> {
    let mut cursor = Cursor::new(Vec::new());
    write_state(state, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Serialize `state` into `out` at its current position.
pub fn write_state<W: Write + Seek>(state: &SessionState, out: &mut W) -> Result<(), FormatError> {
    let sources = SourcesRecord { sources: state.sources.iter().map(SourceRecord::of).collect() };
    let bodies: [(&[u8; 4], Vec<u8>); 5] = [
        (b"HEAD", encode(&HeadRecord::of(state))?),
        (b"SRCS", encode(&sources)?),
        (b"SNAP", encode(&SnapshotsRecord::of(&state.snapshots))?),
        (b"PTRJ", encode(&TrajectoryRecord::of(&state.position_trajectory))?),
        (b"ETRJ", encode(&TrajectoryRecord::of(&state.elevation_trajectory))?),
    ];

    let mut offset = (HEADER_FIXED_SIZE + SECTION_ENTRY_SIZE * bodies.len()) as u32;
    let mut sections = Vec::with_capacity(bodies.len());
    for (name, body) in &bodies {
        sections.push(SectionEntry { name: **name, offset, size: body.len() as u32 });
        offset += body.len() as u32;
    }

    FileHeader { version: FORMAT_VERSION, sections }.write(out)?;
    for (_, body) in &bodies {
        body.write_le(out)?;
    }
    log::debug!("[state] wrote {} sources, {} bytes", state.sources.len(), offset);
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn section_name(name: &[u8; 4]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Parse one section; any damage is logged and reported as `None`.
fn read_section<T>(data: &[u8], sections: &[SectionEntry], name: &[u8; 4]) -> Option<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let Some(entry) = sections.iter().find(|s| &s.name == name) else {
        log::warn!("[state] section {} missing, using defaults", section_name(name));
        return None;
    };
    let start = entry.offset as usize;
    let bytes = start
        .checked_add(entry.size as usize)
        .and_then(|end| data.get(start..end));
    let Some(bytes) = bytes else {
        log::warn!(
            "[state] section {} at {}+{} runs past {} bytes, using defaults",
            section_name(name),
            entry.offset,
            entry.size,
            data.len()
        );
        return None;
    };
    match T::read_options(&mut Cursor::new(bytes), Endian::Little, ()) {
        Ok(record) => Some(record),
        Err(err) => {
            log::warn!("[state] section {} unreadable ({}), using defaults", section_name(name), err);
            None
        }
    }
}

/// Restore a `SessionState` from bytes produced by `save_state`.
///
/// Fails only when the container itself is unusable. Missing or damaged
/// sections and out-of-range enum values fall back to defaults.
pub fn load_state(data: &[u8]) -> Result<SessionState, FormatError> {
    if data.len() >= MAGIC.len() && &data[..MAGIC.len()] != MAGIC {
        return Err(FormatError::InvalidHeader);
    }
    let header = FileHeader::read(&mut Cursor::new(data))?;
    if header.version > FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(header.version));
    }
    log::debug!(
        "[state] version {}, {} sections: {}",
        header.version,
        header.sections.len(),
        header.sections.iter().map(|s| section_name(&s.name)).collect::<Vec<_>>().join(", ")
    );

    let sections = &header.sections;
    let mut state = SessionState::default();

    if let Some(head) = read_section::<HeadRecord>(data, sections, b"HEAD") {
        state.mode = or_default(SpatMode::from_u8(head.mode), "mode", head.mode);
        state.position_policy = or_default(
            PositionPolicy::from_u8(head.position_policy),
            "position policy",
            head.position_policy,
        );
        state.elevation_policy = or_default(
            ElevationPolicy::from_u8(head.elevation_policy),
            "elevation policy",
            head.elevation_policy,
        );
    }
    if let Some(record) = read_section::<SourcesRecord>(data, sections, b"SRCS") {
        state.sources = record.sources.iter().map(|r| r.to_source(state.mode)).collect();
    }
    if let Some(record) = read_section::<SnapshotsRecord>(data, sections, b"SNAP") {
        state.snapshots = record.to_snapshots();
    }
    if let Some(record) = read_section::<TrajectoryRecord>(data, sections, b"PTRJ") {
        state.position_trajectory = record.to_state(false);
    }
    if let Some(record) = read_section::<TrajectoryRecord>(data, sections, b"ETRJ") {
        state.elevation_trajectory = record.to_state(true);
    }

    log::debug!(
        "[state] loaded {} sources, {} snapshots, {} + {} waypoints",
        state.sources.len(),
        state.snapshots.len(),
        state.position_trajectory.path.len(),
        state.elevation_trajectory.path.len()
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_ir::Degrees;

    fn sample_state() -> SessionState {
        let mode = SpatMode::Cube;
        let mut sources: Vec<Source> =
            (0..4).map(|i| Source::evenly_spaced(i, 4, 0.3, mode)).collect();
        sources[1].set_elevation(Degrees(33.0).into());
        sources[2].set_azimuth_span(Normalized::new(0.25));
        for s in &mut sources {
            s.fix_position(true);
        }
        let mut position_trajectory =
            TrajectoryState::new(TrajectoryKind::Position(TrajectoryShape::TriangleClockwise));
        position_trajectory.path =
            sp_ir::build_shape(TrajectoryShape::TriangleClockwise, sources[0].position());
        position_trajectory.back_and_forth = true;
        position_trajectory.damping_cycles = 4;
        position_trajectory.deviation_per_cycle = Degrees(12.5).into();
        SessionState {
            mode,
            snapshots: SourcesSnapshots::capture(&sources),
            sources,
            position_policy: PositionPolicy::DeltaLock,
            elevation_policy: ElevationPolicy::BottomTop,
            position_trajectory,
            elevation_trajectory: TrajectoryState::new(TrajectoryKind::Elevation(
                ElevationShape::UpDown,
            )),
        }
    }

    fn first_section_offset(bytes: &[u8]) -> usize {
        let at = HEADER_FIXED_SIZE + 4;
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
    }

    #[test]
    fn round_trip_is_exact() {
        let state = sample_state();
        let bytes = save_state(&state).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        let loaded = load_state(&bytes).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn empty_state_round_trips() {
        let state = SessionState::default();
        let loaded = load_state(&save_state(&state).unwrap()).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn bad_magic_is_invalid_header() {
        let mut bytes = save_state(&sample_state()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(load_state(&bytes), Err(FormatError::InvalidHeader)));
    }

    #[test]
    fn truncated_header_is_eof() {
        let bytes = save_state(&sample_state()).unwrap();
        assert!(matches!(load_state(&bytes[..8]), Err(FormatError::UnexpectedEof)));
    }

    #[test]
    fn newer_version_is_refused() {
        let mut bytes = save_state(&sample_state()).unwrap();
        bytes[4..6].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            load_state(&bytes),
            Err(FormatError::UnsupportedVersion(v)) if v == FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn out_of_range_policy_falls_back() {
        let state = sample_state();
        let mut bytes = save_state(&state).unwrap();
        let head = first_section_offset(&bytes);
        bytes[head + 1] = 99;
        let loaded = load_state(&bytes).unwrap();
        assert_eq!(loaded.position_policy, PositionPolicy::Independent);
        assert_eq!(loaded.mode, SpatMode::Cube);
        assert_eq!(loaded.elevation_policy, ElevationPolicy::BottomTop);
        assert_eq!(loaded.sources, state.sources);
    }

    #[test]
    fn missing_section_uses_defaults() {
        let state = sample_state();
        let mut bytes = save_state(&state).unwrap();
        // rename HEAD in the directory
        bytes[HEADER_FIXED_SIZE..HEADER_FIXED_SIZE + 4].copy_from_slice(b"XXXX");
        let loaded = load_state(&bytes).unwrap();
        assert_eq!(loaded.mode, SpatMode::Dome);
        assert_eq!(loaded.position_policy, PositionPolicy::Independent);
        assert_eq!(loaded.position_trajectory, state.position_trajectory);
    }

    #[test]
    fn truncated_body_keeps_earlier_sections() {
        let state = sample_state();
        let bytes = save_state(&state).unwrap();
        // drop the tail of the last (elevation trajectory) section
        let loaded = load_state(&bytes[..bytes.len() - 3]).unwrap();
        assert_eq!(loaded.sources, state.sources);
        assert_eq!(loaded.position_trajectory, state.position_trajectory);
        assert_eq!(
            loaded.elevation_trajectory,
            SessionState::default().elevation_trajectory
        );
    }
}
