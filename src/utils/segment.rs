use std::cmp::Ordering;

use super::{
    compare::{almost_equal, greater_or_equal, less_or_equal, TOLERANCE},
    convexity::orientation,
    vec2::Vec2,
};

/// A point shared by two segments `a` and `b`.
///
/// `t` is the parameter along `a` (`a0 + t * (a1 - a0)`), `s` the parameter along `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHit {
    pub position: Vec2,
    pub t: f64,
    pub s: f64,
}

/// The point on segment `a -> b` closest to `p`, its parameter along the segment and its distance to `p`.
#[must_use]
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f64, f64) {
    let ab = b - a;
    let squared_length = ab.squared_length();

    let t = if squared_length == 0.0 {
        0.0
    } else {
        ((p - a).dot(ab) / squared_length).clamp(0.0, 1.0)
    };
    let closest = a.lerp(b, t);

    (closest, t, closest.distance(p))
}

/// Parameters `(t, s)` of the intersection of the lines through `a0 -> a1` and `b0 -> b1`.
///
/// `None` if the lines are parallel within the relative tolerance.
#[must_use]
pub fn line_parameters(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<(f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denominator = da.cross(db);
    let scale = da.length() * db.length();

    if scale == 0.0 || almost_equal(denominator / scale, 0.0, TOLERANCE) {
        return None;
    }

    let w = b0 - a0;

    Some((w.cross(db) / denominator, w.cross(da) / denominator))
}

/// Checks if the segments cross in a single point interior to both of them.
///
/// Touching at an endpoint, collinear overlap and crossings closer to an endpoint than the relative tolerance
/// do not count.
#[must_use]
pub fn segments_cross(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
    let o0 = orientation(a0, a1, b0);
    let o1 = orientation(a0, a1, b1);
    let o2 = orientation(b0, b1, a0);
    let o3 = orientation(b0, b1, a1);

    o0 != Ordering::Equal
        && o1 != Ordering::Equal
        && o2 != Ordering::Equal
        && o3 != Ordering::Equal
        && o0 != o1
        && o2 != o3
}

fn within_segment(param: f64, length: f64, tolerance: f64) -> bool {
    greater_or_equal(param * length, -tolerance, TOLERANCE)
        && less_or_equal((param - 1.0) * length, tolerance, TOLERANCE)
}

/// Checks if the parameter lies within `tolerance` (a distance) of either endpoint.
#[must_use]
pub fn is_at_endpoint(param: f64, length: f64, tolerance: f64) -> bool {
    less_or_equal(param.abs() * length, tolerance, TOLERANCE)
        || less_or_equal((1.0 - param).abs() * length, tolerance, TOLERANCE)
}

/// All points where segment `a` and segment `b` meet, with `tolerance` as absolute distance.
///
/// Reports proper crossings as well as near-endpoint touches, i.e. an endpoint of one segment closer than
/// `tolerance` to the other segment. Overlapping collinear segments report the endpoints contained in the other
/// segment. Points that are endpoints of both segments (shared or nearly coinciding endpoints) are not reported,
/// those are a matter of vertex merging.
#[must_use]
pub fn segment_intersections(
    a0: Vec2,
    a1: Vec2,
    b0: Vec2,
    b1: Vec2,
    tolerance: f64,
) -> Vec<SegmentHit> {
    let length_a = a0.distance(a1);
    let length_b = b0.distance(b1);

    if length_a == 0.0 || length_b == 0.0 {
        return Vec::new();
    }

    let mut candidates = Vec::with_capacity(5);

    for (p, s) in [(b0, 0.0), (b1, 1.0)] {
        let (_, t, distance) = closest_point_on_segment(p, a0, a1);
        if less_or_equal(distance, tolerance, TOLERANCE) {
            candidates.push(SegmentHit { position: p, t, s });
        }
    }

    for (p, t) in [(a0, 0.0), (a1, 1.0)] {
        let (_, s, distance) = closest_point_on_segment(p, b0, b1);
        if less_or_equal(distance, tolerance, TOLERANCE) {
            candidates.push(SegmentHit { position: p, t, s });
        }
    }

    if let Some((t, s)) = line_parameters(a0, a1, b0, b1) {
        if within_segment(t, length_a, tolerance) && within_segment(s, length_b, tolerance) {
            let t = t.clamp(0.0, 1.0);
            let s = s.clamp(0.0, 1.0);
            candidates.push(SegmentHit {
                position: a0.lerp(a1, t),
                t,
                s,
            });
        }
    }

    let mut hits: Vec<SegmentHit> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if is_at_endpoint(candidate.t, length_a, tolerance)
            && is_at_endpoint(candidate.s, length_b, tolerance)
        {
            continue;
        }

        let duplicate = hits.iter().any(|hit| {
            hit.position == candidate.position
                || less_or_equal(hit.position.distance(candidate.position), tolerance, TOLERANCE)
        });
        if !duplicate {
            hits.push(candidate);
        }
    }

    hits
}
