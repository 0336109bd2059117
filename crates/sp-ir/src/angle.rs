//! Angle and normalized scalar value types.
//!
//! Every angle in the engine is stored as `Radians`. `Degrees` only exists
//! at the edges (UI, automation parameters, CLI arguments), and
//! `Normalized` is the [0, 1] scale used by host-automatable parameters.

use core::f32::consts::{FRAC_PI_2, PI, TAU};
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// ── Radians ─────────────────────────────────────────────────────────

/// An angle in radians.
///
/// Arithmetic never wraps on its own; call `simplified()` to fold the
/// value into (-π, π].
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Radians(pub f32);

impl Radians {
    pub const ZERO: Self = Self(0.0);
    pub const QUARTER_TURN: Self = Self(FRAC_PI_2);
    pub const HALF_TURN: Self = Self(PI);

    /// Raw value in radians.
    pub const fn get(self) -> f32 {
        self.0
    }

    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0 * (180.0 / PI))
    }

    /// Fold into (-π, π].
    pub fn simplified(self) -> Self {
        let mut v = libm::fmodf(self.0, TAU);
        if v <= -PI {
            v += TAU;
        } else if v > PI {
            v -= TAU;
        }
        Self(v)
    }

    pub fn clamped(self, min: Radians, max: Radians) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }

    pub fn sin(self) -> f32 {
        libm::sinf(self.0)
    }

    pub fn cos(self) -> f32 {
        libm::cosf(self.0)
    }

    /// Azimuth on the host parameter scale.
    ///
    /// [0°, 180°] maps to [0, 0.5], (-180°, 0°) maps to (0.5, 1).
    pub fn to_normalized_azimuth(self) -> Normalized {
        let deg = self.simplified().to_degrees().0;
        if deg >= 0.0 {
            Normalized::new((deg / 360.0).min(0.5))
        } else {
            Normalized::new((deg + 360.0) / 360.0)
        }
    }

    /// Inverse of `to_normalized_azimuth`.
    ///
    /// (0.5, 1) maps to (-180°, 0°); the closed end 1.0 is the same
    /// direction as 0.0 and maps to 0°.
    pub fn from_normalized_azimuth(value: Normalized) -> Self {
        let n = value.get();
        if n >= 1.0 {
            Self::ZERO
        } else if n <= 0.5 {
            Degrees(n * 360.0).into()
        } else {
            Degrees(n * 360.0 - 360.0).into()
        }
    }

    /// Elevation on the host parameter scale: 0 at the horizon, 1 at the zenith.
    pub fn to_normalized_elevation(self) -> Normalized {
        Normalized::new(self.0 / FRAC_PI_2)
    }

    pub fn from_normalized_elevation(value: Normalized) -> Self {
        Self(value.get() * FRAC_PI_2)
    }
}

impl Add for Radians {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Radians {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f32> for Radians {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self(self.0 * rhs)
    }
}

impl Neg for Radians {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Radians {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Radians {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<Degrees> for Radians {
    fn from(d: Degrees) -> Self {
        Self(d.0 * (PI / 180.0))
    }
}

// ── Degrees ─────────────────────────────────────────────────────────

/// An angle in degrees. Converted to `Radians` before any math.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Degrees(pub f32);

impl Degrees {
    pub const fn get(self) -> f32 {
        self.0
    }

    pub fn to_radians(self) -> Radians {
        self.into()
    }
}

impl From<Radians> for Degrees {
    fn from(r: Radians) -> Self {
        r.to_degrees()
    }
}

// ── Normalized ──────────────────────────────────────────────────────

/// A scalar clamped to [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Normalized(f32);

impl Normalized {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// Clamp `value` into [0, 1]. NaN becomes 0.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub const fn get(self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn simplified_folds_into_half_open_range() {
        assert!(approx(Radians(3.0 * PI).simplified().0, PI));
        assert!(approx(Radians(-PI).simplified().0, PI));
        assert!(approx(Radians(TAU).simplified().0, 0.0));
        assert!(approx(Radians(-FRAC_PI_2).simplified().0, -FRAC_PI_2));
    }

    #[test]
    fn arithmetic_does_not_wrap() {
        let a = Radians(PI) + Radians(PI);
        assert!(approx(a.0, TAU));
        assert!(approx((Radians::QUARTER_TURN * 4.0).0, TAU));
    }

    #[test]
    fn degree_conversion() {
        let r: Radians = Degrees(90.0).into();
        assert!(approx(r.0, FRAC_PI_2));
        assert!(approx(Radians(PI).to_degrees().0, 180.0));
    }

    #[test]
    fn normalized_azimuth_halves() {
        assert!(approx(Radians::from(Degrees(0.0)).to_normalized_azimuth().get(), 0.0));
        assert!(approx(Radians::from(Degrees(90.0)).to_normalized_azimuth().get(), 0.25));
        assert!(approx(Radians::from(Degrees(180.0)).to_normalized_azimuth().get(), 0.5));
        assert!(approx(Radians::from(Degrees(-90.0)).to_normalized_azimuth().get(), 0.75));
    }

    #[test]
    fn normalized_azimuth_round_trip_at_boundaries() {
        for deg in [0.0f32, 90.0, 180.0, 360.0, -45.0, -179.0] {
            let r: Radians = Degrees(deg).into();
            let back = Radians::from_normalized_azimuth(r.to_normalized_azimuth());
            let diff = (back - r).simplified().0.abs();
            assert!(diff < 1e-3, "{} deg came back as {:?}", deg, back.to_degrees());
        }
    }

    #[test]
    fn from_normalized_azimuth_splits_at_half() {
        assert!(approx(Radians::from_normalized_azimuth(Normalized::new(0.5)).to_degrees().0, 180.0));
        assert!(approx(Radians::from_normalized_azimuth(Normalized::new(0.75)).to_degrees().0, -90.0));
    }

    #[test]
    fn normalized_azimuth_one_folds_onto_zero() {
        assert_eq!(Radians::from_normalized_azimuth(Normalized::ONE), Radians::ZERO);
        assert_eq!(Radians::from_normalized_azimuth(Normalized::new(1.7)), Radians::ZERO);
        let almost = Radians::from_normalized_azimuth(Normalized::new(0.999)).to_degrees().0;
        assert!(almost < 0.0 && almost > -1.0);
        assert!(approx(Radians::ZERO.to_normalized_azimuth().get(), 0.0));
    }

    #[test]
    fn normalized_clamps() {
        assert_eq!(Normalized::new(1.5).get(), 1.0);
        assert_eq!(Normalized::new(-0.2).get(), 0.0);
        assert_eq!(Normalized::new(f32::NAN).get(), 0.0);
    }

    #[test]
    fn normalized_elevation_scale() {
        assert!(approx(Radians::QUARTER_TURN.to_normalized_elevation().get(), 1.0));
        assert!(approx(Radians::from_normalized_elevation(Normalized::new(0.5)).to_degrees().0, 45.0));
    }
}
