use std::cmp::Ordering;

use nalgebra::Matrix3;

use super::{
    compare::{compare, greater, TOLERANCE},
    vec2::Vec2,
};

/// Orientation of the triple `(a, b, c)`.
///
/// `Greater` for a counter-clockwise (left) turn, `Less` for a clockwise turn, `Equal` if the points are
/// collinear within the relative tolerance. The cross product is taken at the corner opposite the longest side
/// and normalized by the lengths of both legs, i.e. the sine of the largest angle is compared. This makes the test
/// independent of the coordinate scale and gives the same answer for every order of the arguments, up to the sign
/// flip of odd permutations.
#[must_use]
pub fn orientation(a: Vec2, b: Vec2, c: Vec2) -> Ordering {
    let sides = [
        (b - c).squared_length(),
        (c - a).squared_length(),
        (a - b).squared_length(),
    ];
    let corners = [a, b, c];

    let mut apex = 0;
    for i in 1..3 {
        let longer = sides[i].total_cmp(&sides[apex]);
        if longer.is_gt() || (longer.is_eq() && cmp_total(corners[i], corners[apex]).is_lt()) {
            apex = i;
        }
    }

    let m = corners[apex];
    let p = corners[(apex + 1) % 3];
    let q = corners[(apex + 2) % 3];

    let mp = p - m;
    let mq = q - m;
    let scale = mp.length() * mq.length();

    if scale == 0.0 {
        return Ordering::Equal;
    }

    compare(mp.cross(mq) / scale, 0.0, TOLERANCE)
}

fn cmp_total(a: Vec2, b: Vec2) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

/// Checks if `a -> b -> c` is a strict left turn, i.e. the angle at `b` is convex for a counter-clockwise chain.
#[must_use]
pub fn is_left_turn(a: Vec2, b: Vec2, c: Vec2) -> bool {
    orientation(a, b, c) == Ordering::Greater
}

/// Checks if `d` lies strictly inside the circumcircle of `a, b, c`.
///
/// The triangle is brought into counter-clockwise order first, so the winding of the input does not matter.
/// The incircle determinant is normalized by the sum of the absolute values of its terms before comparing against zero.
#[must_use]
pub fn in_circumcircle(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let (b, c) = if orientation(a, b, c) == Ordering::Less {
        (c, b)
    } else {
        (b, c)
    };

    let ad = a - d;
    let bd = b - d;
    let cd = c - d;

    let m = Matrix3::new(
        ad.x,
        ad.y,
        ad.squared_length(),
        bd.x,
        bd.y,
        bd.squared_length(),
        cd.x,
        cd.y,
        cd.squared_length(),
    );
    let det = m.determinant();

    let permanent = ad.squared_length() * ((bd.x * cd.y).abs() + (bd.y * cd.x).abs())
        + bd.squared_length() * ((cd.x * ad.y).abs() + (cd.y * ad.x).abs())
        + cd.squared_length() * ((ad.x * bd.y).abs() + (ad.y * bd.x).abs());

    if permanent == 0.0 {
        return false;
    }

    greater(det / permanent, 0.0, TOLERANCE)
}

/// Center and radius of the circle through `a, b, c`, `None` for collinear points.
#[must_use]
pub fn circumcircle(a: Vec2, b: Vec2, c: Vec2) -> Option<(Vec2, f64)> {
    if orientation(a, b, c) == Ordering::Equal {
        return None;
    }

    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * ab.cross(ac);

    let ux = (ac.y * ab.squared_length() - ab.y * ac.squared_length()) / d;
    let uy = (ab.x * ac.squared_length() - ac.x * ab.squared_length()) / d;
    let offset = Vec2::new(ux, uy);

    Some((a + offset, offset.length()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);

        assert_eq!(orientation(a, b, Vec2::new(0.5, 1.0)), Ordering::Greater);
        assert_eq!(orientation(a, b, Vec2::new(0.5, -1.0)), Ordering::Less);
        assert_eq!(orientation(a, b, Vec2::new(2.0, 0.0)), Ordering::Equal);
        assert_eq!(orientation(a, a, Vec2::new(2.0, 3.0)), Ordering::Equal);
        assert!(is_left_turn(a, b, Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_orientation_is_scale_invariant() {
        let s = 1e-9;
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(s, 0.0);
        let c = Vec2::new(0.5 * s, 0.1 * s);

        assert_eq!(orientation(a, b, c), Ordering::Greater);
    }

    #[test]
    fn test_orientation_is_consistent_under_permutation() {
        let a = Vec2::new(-3.480617962315388, 5.032257406794097);
        let b = Vec2::new(-3.480617962344997, 5.032257406651849);
        let c = Vec2::new(4.25, -1.5);

        let o = orientation(a, b, c);
        assert_ne!(o, Ordering::Equal);
        assert_eq!(orientation(b, c, a), o);
        assert_eq!(orientation(c, a, b), o);
        assert_eq!(orientation(b, a, c), o.reverse());
        assert_eq!(orientation(a, c, b), o.reverse());
        assert_eq!(orientation(c, b, a), o.reverse());
    }

    #[test]
    fn test_in_circumcircle() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let c = Vec2::new(0.0, 1.0);

        assert!(in_circumcircle(a, b, c, Vec2::new(0.5, 0.5)));
        assert!(in_circumcircle(a, c, b, Vec2::new(0.5, 0.5)));
        assert!(!in_circumcircle(a, b, c, Vec2::new(2.0, 2.0)));

        // co-circular points are not strictly inside
        assert!(!in_circumcircle(a, b, c, Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_circumcircle() {
        let (center, radius) = circumcircle(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 2.0),
        )
        .unwrap();

        assert_eq!(center, Vec2::new(1.0, 1.0));
        assert!((radius - 2f64.sqrt()).abs() < 1e-12);
        assert!(circumcircle(Vec2::ZERO, Vec2::X_AXIS, Vec2::new(2.0, 0.0)).is_none());
    }
}
