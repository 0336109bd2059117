//! 2D points in the normalized drawing field.
//!
//! The field is the unit square with its centre at (0.5, 0.5). Source
//! positions, waypoints and link snapshots all live in this space.

use core::ops::{Add, Mul, Sub};

use crate::angle::Radians;

/// Centre of the drawing field.
pub const FIELD_CENTER: Point = Point { x: 0.5, y: 0.5 };

/// Distance from the centre to the edge of the field.
pub const FIELD_RADIUS: f32 = 0.5;

/// Inset kept free along every edge when generating trajectory shapes.
pub const FIELD_MARGIN: f32 = 0.02;

/// A point (or offset) in field coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length when read as an offset.
    pub fn length(self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y)
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    /// Polar angle of this offset (`atan2(y, x)`).
    pub fn angle(self) -> Radians {
        Radians(libm::atan2f(self.y, self.x))
    }

    /// Offset of the given length along `angle`.
    pub fn from_polar(radius: f32, angle: Radians) -> Self {
        Self { x: radius * angle.cos(), y: radius * angle.sin() }
    }

    /// Rotate this offset around the origin.
    pub fn rotated(self, angle: Radians) -> Self {
        let (s, c) = (angle.sin(), angle.cos());
        Self { x: self.x * c - self.y * s, y: self.x * s + self.y * c }
    }

    /// Rotate this point around `pivot`.
    pub fn rotated_around(self, pivot: Point, angle: Radians) -> Self {
        pivot + (self - pivot).rotated(angle)
    }

    /// Linear interpolation, `t` in [0, 1].
    pub fn lerp(self, to: Point, t: f32) -> Self {
        self + (to - self) * t
    }

    pub fn clamped(self, min: f32, max: f32) -> Self {
        Self { x: self.x.clamp(min, max), y: self.y.clamp(min, max) }
    }

    /// Clamp into the unit square.
    pub fn clamped_to_field(self) -> Self {
        self.clamped(0.0, 1.0)
    }

    /// Clamp into the unit square minus `FIELD_MARGIN` on every side.
    pub fn clamped_to_interior(self) -> Self {
        self.clamped(FIELD_MARGIN, 1.0 - FIELD_MARGIN)
    }

    /// Mirror across the vertical centre line (x → 1 - x).
    pub fn mirrored_x(self) -> Self {
        Self { x: 1.0 - self.x, y: self.y }
    }

    /// Mirror across the horizontal centre line (y → 1 - y).
    pub fn mirrored_y(self) -> Self {
        Self { x: self.x, y: 1.0 - self.y }
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f32> for Point {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// A point expressed as radius and angle around `FIELD_CENTER`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldPolar {
    pub radius: f32,
    pub angle: Radians,
}

impl FieldPolar {
    pub fn of(point: Point) -> Self {
        let offset = point - FIELD_CENTER;
        Self { radius: offset.length(), angle: offset.angle() }
    }

    pub fn to_point(self) -> Point {
        FIELD_CENTER + Point::from_polar(self.radius, self.angle)
    }
}
