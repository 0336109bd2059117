//! Core value and state types for the spatium motion engine.
//!
//! This crate defines the data every other crate agrees on: angles,
//! field points, sources, waypoint paths and the shapes that generate
//! them, link policies with their anchor snapshots, and the full
//! persisted session state. The runtime lives in `sp-engine`.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod angle;
mod coords;
mod link;
mod path;
mod point;
mod session;
mod shape;
mod source;

pub use angle::{Degrees, Normalized, Radians};
pub use coords::{
    cube_to_point, dome_to_point, point_to_cube, point_to_dome, SpatMode, MAX_CUBE_DISTANCE,
};
pub use link::{
    ElevationPolicy, PositionPolicy, SourceSnapshot, SourcesSnapshots, MAX_SOURCES,
};
pub use path::WaypointPath;
pub use point::{FieldPolar, Point, FIELD_CENTER, FIELD_MARGIN, FIELD_RADIUS};
pub use session::{SessionState, TrajectoryState, DEFAULT_CYCLE_DURATION};
pub use shape::{
    build_elevation_shape, build_shape, elevation_to_waypoint_y, sample_count,
    waypoint_y_to_elevation, ElevationShape, TrajectoryKind, TrajectoryShape, CIRCLE_SAMPLES,
    ELEVATION_SAMPLES, POLYGON_SAMPLES, SPIRAL_TURNS,
};
pub use source::{Source, SourceAnchor, SourceFields, SourceId, SourcePosition};
