//! Conversions between field positions and spherical coordinates.
//!
//! Azimuth 0 points at the top edge of the field (y = 0); positive
//! azimuth turns toward the left edge (x = 0).
//!
//! Dome mode maps elevation to the distance from the centre: 90° sits on
//! the centre, 0° on the rim. Cube mode maps `distance` to the same
//! radius (1.0 = rim) and leaves elevation as an independent height.

use core::f32::consts::FRAC_PI_2;

use crate::angle::Radians;
use crate::point::{Point, FIELD_CENTER, FIELD_RADIUS};

/// Below this radius (in field units) the azimuth is undefined and the
/// previous one is kept.
const AZIMUTH_EPSILON: f32 = 1e-6;

/// Largest cube-mode distance: the corners of the field.
pub const MAX_CUBE_DISTANCE: f32 = core::f32::consts::SQRT_2;

/// Spatialization convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpatMode {
    /// Azimuth + elevation projected onto a hemisphere.
    #[default]
    Dome = 0,
    /// Azimuth + distance on the plane, elevation as height.
    Cube = 1,
}

impl SpatMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dome),
            1 => Some(Self::Cube),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dome => "dome",
            Self::Cube => "cube",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dome" => Some(Self::Dome),
            "cube" => Some(Self::Cube),
            _ => None,
        }
    }
}

fn direction(azimuth: Radians) -> Point {
    Point::new(-azimuth.sin(), -azimuth.cos())
}

fn azimuth_of(offset: Point, previous: Radians) -> Radians {
    if offset.length() < AZIMUTH_EPSILON {
        return previous;
    }
    Radians(libm::atan2f(-offset.x, -offset.y)).simplified()
}

/// Dome position for the given azimuth and elevation.
///
/// Elevation is clamped to [0°, 90°].
pub fn dome_to_point(azimuth: Radians, elevation: Radians) -> Point {
    let elevation = elevation.clamped(Radians::ZERO, Radians::QUARTER_TURN);
    let radius = 1.0 - elevation.0 / FRAC_PI_2;
    FIELD_CENTER + direction(azimuth) * (radius * FIELD_RADIUS)
}

/// Azimuth and elevation of a dome position.
///
/// Points outside the rim read as elevation 0.
pub fn point_to_dome(point: Point, previous_azimuth: Radians) -> (Radians, Radians) {
    let offset = point - FIELD_CENTER;
    let radius = (offset.length() / FIELD_RADIUS).min(1.0);
    let elevation = Radians((1.0 - radius) * FRAC_PI_2);
    (azimuth_of(offset, previous_azimuth), elevation)
}

/// Cube position for the given azimuth and distance (unclamped).
pub fn cube_to_point(azimuth: Radians, distance: f32) -> Point {
    FIELD_CENTER + direction(azimuth) * (distance.max(0.0) * FIELD_RADIUS)
}

/// Azimuth and distance of a cube position.
pub fn point_to_cube(point: Point, previous_azimuth: Radians) -> (Radians, f32) {
    let offset = point - FIELD_CENTER;
    let distance = offset.length() / FIELD_RADIUS;
    (azimuth_of(offset, previous_azimuth), distance)
}
