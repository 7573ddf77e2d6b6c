//! Tolerant scalar comparisons.
//!
//! All comparisons of positions, lengths and angles go through this family instead of `==` or `<`.
//! The ordering helpers are derived from [`almost_equal`], so two values are never both "equal" and "less".

use std::cmp::Ordering;

/// The relative tolerance used whenever a caller does not supply one.
///
/// Values are compared relative to `max(|a|, |b|, 1.0)`, i.e. the tolerance is absolute for magnitudes below one.
pub const TOLERANCE: f64 = 1e-12;

/// `true` if `a == b` or `|a - b| <= tol * max(|a|, |b|, 1.0)`.
///
/// Non-finite values are only equal when they are identical.
#[must_use]
pub fn almost_equal(a: f64, b: f64, tol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }

    let scale = a.abs().max(b.abs()).max(1.0);

    (a - b).abs() <= tol * scale
}

#[must_use]
pub fn less(a: f64, b: f64, tol: f64) -> bool {
    !almost_equal(a, b, tol) && a < b
}

#[must_use]
pub fn greater(a: f64, b: f64, tol: f64) -> bool {
    !almost_equal(a, b, tol) && a > b
}

#[must_use]
pub fn less_or_equal(a: f64, b: f64, tol: f64) -> bool {
    almost_equal(a, b, tol) || a < b
}

#[must_use]
pub fn greater_or_equal(a: f64, b: f64, tol: f64) -> bool {
    almost_equal(a, b, tol) || a > b
}

/// Three-way tolerant comparison, `Equal` whenever [`almost_equal`] holds.
#[must_use]
pub fn compare(a: f64, b: f64, tol: f64) -> Ordering {
    if almost_equal(a, b, tol) {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}
