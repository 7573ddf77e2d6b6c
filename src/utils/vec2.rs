use core::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use nalgebra::Vector2;

use super::compare::{almost_equal, TOLERANCE};

/// A 2D vector / position.
///
/// Equality is tolerant (see [`crate::utils::compare`]), which makes `Vec2` usable as a clustering key for vertices.
/// As tolerant equality is not transitive `Vec2` is neither `Eq` nor `Hash`; ordered lookups use
/// [`crate::utils::point_order::PositionKey`] instead.
///
/// ```
/// use tessel::Vec2;
///
/// let a = Vec2::new(1.0, 0.0);
/// let b = Vec2::new(0.0, 1.0);
///
/// assert_eq!(a.cross(b), 1.0);
/// assert_eq!(a + b, Vec2::new(1.0, 1.0));
/// assert_eq!((a * 3.0).length(), 3.0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const X_AXIS: Self = Self::new(1.0, 0.0);
    pub const Y_AXIS: Self = Self::new(0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The z-component of the 3D cross product, positive if `other` is counter-clockwise of `self`.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[must_use]
    pub fn squared_length(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// The unit vector pointing in the same direction, or the zero vector for a zero-length input.
    #[must_use]
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == 0.0 {
            Self::ZERO
        } else {
            self / length
        }
    }

    /// Linear interpolation, `self` for `t = 0` and `other` for `t = 1`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    /// Round both coordinates to `digits` decimal digits.
    #[must_use]
    pub fn round(self, digits: i32) -> Self {
        let factor = 10f64.powi(digits);
        Self::new(
            (self.x * factor).round() / factor,
            (self.y * factor).round() / factor,
        )
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Tolerant equality with a caller supplied relative tolerance.
    #[must_use]
    pub fn almost_equal(self, other: Self, tol: f64) -> bool {
        almost_equal(self.x, other.x, tol) && almost_equal(self.y, other.y, tol)
    }
}

impl PartialEq for Vec2 {
    fn eq(&self, other: &Self) -> bool {
        self.almost_equal(*other, TOLERANCE)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        rhs * self
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

impl From<Vector2<f64>> for Vec2 {
    fn from(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vec2> for Vector2<f64> {
    fn from(v: Vec2) -> Self {
        Vector2::new(v.x, v.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}; {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);

        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(a - b, Vec2::new(-2.0, 3.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));
        assert_eq!(2.0 * a, Vec2::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vec2::new(1.5, -0.5));
        assert_eq!(a.dot(b), 1.0);
        assert_eq!(a.cross(b), -7.0);
        assert_eq!(Vec2::X_AXIS.cross(Vec2::Y_AXIS), 1.0);
    }

    #[test]
    fn test_length_and_normalize() {
        let v = Vec2::new(3.0, 4.0);

        assert_eq!(v.length(), 5.0);
        assert_eq!(v.squared_length(), 25.0);
        assert_eq!(v.normalize(), Vec2::new(0.6, 0.8));
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert_eq!(Vec2::ZERO.distance(v), 5.0);
    }

    #[test]
    fn test_tolerant_equality() {
        let a = Vec2::new(1.0, 1.0);

        assert_eq!(a, Vec2::new(1.0 + 1e-14, 1.0 - 1e-14));
        assert_ne!(a, Vec2::new(1.0 + 1e-6, 1.0));
    }

    #[test]
    fn test_round() {
        let v = Vec2::new(1.23456, -7.891011);

        assert!(v.round(2).almost_equal(Vec2::new(1.23, -7.89), 0.0));
        assert!(v.round(0).almost_equal(Vec2::new(1.0, -8.0), 0.0));
    }

    #[test]
    fn test_conversions() {
        let v: Vec2 = [1.0, 2.0].into();
        let n: Vector2<f64> = v.into();

        assert_eq!(n, Vector2::new(1.0, 2.0));
        assert_eq!(Vec2::from(n), v);
        assert_eq!(<[f64; 2]>::from(v), [1.0, 2.0]);
        assert_eq!(Vec2::from((1.0, 2.0)), v);
        assert_eq!(format!("{}", v), "(1; 2)");
    }
}
