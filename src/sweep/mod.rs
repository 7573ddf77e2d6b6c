//! Segment intersection by a Bentley–Ottmann sweep.
//!
//! With a positive tolerance the sweep also reports near-touches: an endpoint closer than the tolerance to
//! another segment counts as lying on it.

use std::collections::{BTreeMap, BTreeSet};

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::utils::{
    point_order::PositionKey,
    segment::segment_intersections,
    types::{Segment2, SegmentIdx},
    vec2::Vec2,
};

pub mod event;
pub mod sweep_line;

use sweep_line::SweepLine;

/// An intersection as seen from one segment.
///
/// `edges[0]` is the segment the record belongs to, `t` the parameter of the position along it
/// (`v0 + t * (v1 - v0)`). `s` is the parameter along the other segment `edges[1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeIntersection {
    pub position: Vec2,
    pub edges: [SegmentIdx; 2],
    pub t: f64,
    pub s: f64,
}

impl EdgeIntersection {
    /// The parameter of the position along `edge`, `None` if `edge` is not involved.
    #[must_use]
    pub fn parameter_on(&self, edge: SegmentIdx) -> Option<f64> {
        match self.edges {
            [e0, _] if e0 == edge => Some(self.t),
            [_, e1] if e1 == edge => Some(self.s),
            _ => None,
        }
    }

    /// The segment met by `edge` at this position.
    #[must_use]
    pub fn other(&self, edge: SegmentIdx) -> Option<SegmentIdx> {
        match self.edges {
            [e0, e1] if e0 == edge => Some(e1),
            [e0, e1] if e1 == edge => Some(e0),
            _ => None,
        }
    }
}

/// A position where two or more segments meet, together with all of them.
#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    pub position: Vec2,
    pub segments: Vec<SegmentIdx>,
}

fn sweep(segments: &[Segment2], tolerance: f64) -> Option<SweepLine> {
    if segments.len() < 2 {
        return None;
    }

    let mut sweep_line = SweepLine::new(segments, tolerance);
    sweep_line.process();

    Some(sweep_line)
}

/// All positions where at least two segments meet, ordered by x, then y.
///
/// Shared endpoints do not count, touching an interior point does. `tolerance` is an absolute distance,
/// use `0.0` for exact intersections.
///
/// ```
/// use tessel::{intersect, Vec2};
///
/// let segments = [
///     [Vec2::new(0.0, -5.0), Vec2::new(10.0, 5.0)],
///     [Vec2::new(0.0, 5.0), Vec2::new(10.0, -5.0)],
/// ];
///
/// assert_eq!(intersect(&segments, 0.0), vec![Vec2::new(5.0, 0.0)]);
/// ```
#[must_use]
pub fn intersect(segments: &[Segment2], tolerance: f64) -> Vec<Vec2> {
    intersect_full(segments, tolerance)
        .into_iter()
        .map(|intersection| intersection.position)
        .collect()
}

/// Like [`intersect`], with the segments meeting at each position.
#[must_use]
pub fn intersect_full(segments: &[Segment2], tolerance: f64) -> Vec<Intersection> {
    sweep(segments, tolerance)
        .map(|sweep_line| sweep_line.intersections())
        .unwrap_or_default()
}

/// The intersections on each segment with at least one, ordered along the segment from `v0` to `v1`.
#[must_use]
pub fn intersect_detailed(
    segments: &[Segment2],
    tolerance: f64,
) -> BTreeMap<SegmentIdx, Vec<EdgeIntersection>> {
    sweep(segments, tolerance)
        .map(SweepLine::into_edge_intersections)
        .unwrap_or_default()
}

/// All-pairs reference for [`intersect`], checked in parallel.
#[must_use]
pub fn intersect_brute_force(segments: &[Segment2], tolerance: f64) -> Vec<Vec2> {
    let n = segments.len();

    let hits: Vec<Vec2> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let [a0, a1] = segments[i];
            (i + 1..n).flat_map(move |j| {
                let [b0, b1] = segments[j];
                segment_intersections(a0, a1, b0, b1, tolerance)
                    .into_iter()
                    .map(|hit| hit.position)
            })
        })
        .collect();

    hits.into_iter()
        .map(PositionKey)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|key| key.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_test_utils::sample_segments_2d;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    fn to_segments(sampled: Vec<[[f64; 2]; 2]>) -> Vec<Segment2> {
        sampled
            .into_iter()
            .map(|[p0, p1]| [Vec2::from(p0), Vec2::from(p1)])
            .collect()
    }

    #[test]
    fn test_single_crossing() {
        let segments = [[v(0.0, -5.0), v(10.0, 5.0)], [v(0.0, 5.0), v(10.0, -5.0)]];

        assert_eq!(intersect(&segments, 0.0), vec![v(5.0, 0.0)]);

        let detailed = intersect_detailed(&segments, 0.0);
        assert_eq!(detailed.len(), 2);
        let on_first = detailed[&0][0];
        assert_eq!(on_first.edges, [0, 1]);
        assert_eq!(on_first.t, 0.5);
        assert_eq!(on_first.parameter_on(1), Some(0.5));
        assert_eq!(on_first.other(0), Some(1));
        assert_eq!(on_first.other(2), None);
    }

    #[test]
    fn test_vertical_crossing() {
        let segments = [[v(0.0, 0.0), v(10.0, 0.0)], [v(5.0, -5.0), v(5.0, 5.0)]];

        assert_eq!(intersect(&segments, 0.0), vec![v(5.0, 0.0)]);
        assert_eq!(intersect_brute_force(&segments, 0.0), vec![v(5.0, 0.0)]);
    }

    #[test]
    fn test_too_few_segments() {
        assert!(intersect(&[], 0.0).is_empty());
        assert!(intersect(&[[v(0.0, 0.0), v(1.0, 1.0)]], 0.0).is_empty());
        assert!(intersect_detailed(&[[v(0.0, 0.0), v(1.0, 1.0)]], 0.0).is_empty());
    }

    #[test]
    fn test_shared_endpoints_do_not_intersect() {
        let segments = [
            [v(0.0, 0.0), v(1.0, 0.0)],
            [v(1.0, 0.0), v(1.0, 1.0)],
            [v(1.0, 1.0), v(0.0, 0.0)],
        ];

        assert!(intersect(&segments, 1e-9).is_empty());
    }

    #[test]
    fn test_vertical_and_horizontal() {
        let segments = [
            [v(5.0, 0.0), v(5.0, 10.0)],
            [v(0.0, 5.0), v(10.0, 5.0)],
            [v(0.0, 8.0), v(10.0, 8.0)],
            [v(0.0, 12.0), v(10.0, 12.0)],
        ];

        assert_eq!(intersect(&segments, 0.0), vec![v(5.0, 5.0), v(5.0, 8.0)]);

        let detailed = intersect_detailed(&segments, 0.0);
        let on_vertical: Vec<f64> = detailed[&0].iter().map(|i| i.t).collect();
        assert_eq!(on_vertical, vec![0.5, 0.8]);
        assert!(!detailed.contains_key(&3));
    }

    #[test]
    fn test_t_junction() {
        let segments = [[v(0.0, 0.0), v(10.0, 0.0)], [v(4.0, 3.0), v(4.0, 0.0)]];

        assert_eq!(intersect(&segments, 0.0), vec![v(4.0, 0.0)]);

        let detailed = intersect_detailed(&segments, 0.0);
        assert_eq!(detailed[&0][0].t, 0.4);
        assert_eq!(detailed[&1][0].t, 1.0);
    }

    #[test]
    fn test_near_touch_needs_tolerance() {
        let segments = [[v(0.0, 0.0), v(10.0, 0.0)], [v(5.0, 1e-10), v(5.0, 5.0)]];

        assert!(intersect(&segments, 0.0).is_empty());
        assert_eq!(intersect(&segments, 1e-9), vec![v(5.0, 1e-10)]);
    }

    #[test]
    fn test_matches_brute_force() {
        for (seed, n) in [(1, 2), (2, 10), (3, 50), (4, 100), (5, 200)] {
            let segments = to_segments(sample_segments_2d(n, None, seed));

            let swept = intersect(&segments, 0.0);
            let reference = intersect_brute_force(&segments, 0.0);

            assert_eq!(swept, reference, "{} segments, seed {}", n, seed);
        }
    }

    #[test]
    fn test_integer_segments_match_brute_force() {
        for seed in [97, 98, 99] {
            let segments: Vec<Segment2> =
                to_segments(sample_segments_2d(80, Some(-10.0..=10.0), seed))
                    .into_iter()
                    .map(|[p0, p1]| [p0.round(0), p1.round(0)])
                    .collect();

            for tolerance in [0.0, 1e-9] {
                let swept = intersect(&segments, tolerance);
                let reference = intersect_brute_force(&segments, tolerance);

                assert_eq!(swept, reference, "seed {}, tolerance {}", seed, tolerance);
            }
        }
    }

    #[test]
    fn test_collinear_overlaps_match_brute_force() {
        let segments = [
            [v(0.0, 0.0), v(6.0, 0.0)],
            [v(2.0, 0.0), v(9.0, 0.0)],
            [v(4.0, 0.0), v(5.0, 0.0)],
            [v(3.0, -2.0), v(3.0, 4.0)],
            [v(3.0, 1.0), v(3.0, 6.0)],
            [v(0.0, -3.0), v(8.0, 5.0)],
            [v(1.0, -2.0), v(7.0, 4.0)],
            [v(0.0, 4.0), v(8.0, -4.0)],
            [v(-1.0, 2.0), v(10.0, 2.0)],
        ];

        let swept = intersect_full(&segments, 0.0);
        let reference = intersect_brute_force(&segments, 0.0);

        let positions: Vec<Vec2> = swept.iter().map(|i| i.position).collect();
        assert_eq!(positions, reference);

        // the horizontal overlaps, the vertical ones and the falling diagonal all meet at (4, 0)
        let at_four = swept.iter().find(|i| i.position == v(4.0, 0.0)).unwrap();
        assert_eq!(at_four.segments, vec![0, 1, 2, 7]);
    }

    #[test]
    fn test_near_touches_match_brute_force() {
        let tolerance = 1e-9;

        for seed in [5, 6, 7] {
            let mut segments = to_segments(sample_segments_2d(30, Some(-10.0..=10.0), seed));

            // segments starting a fraction of the tolerance off the interior of another one
            for i in 0..10 {
                let [v0, v1] = segments[i];
                let along = (v1 - v0).normalize();
                let normal = Vec2::new(-along.y, along.x);
                let side = if i % 2 == 0 { 1.0 } else { -1.0 };

                let touch = v0.lerp(v1, 0.3 + 0.04 * i as f64);
                let start = touch + normal * (side * 0.3 * tolerance);
                let end = touch + normal * (side * 2.0) + along * 0.5;
                segments.push([start, end]);
            }

            let swept = intersect(&segments, tolerance);
            let reference = intersect_brute_force(&segments, tolerance);

            assert_eq!(swept, reference, "seed {}", seed);
            assert!(intersect(&segments, 0.0).len() < swept.len());
        }
    }

    #[test]
    fn test_every_intersection_is_on_both_edges() {
        let segments = to_segments(sample_segments_2d(60, Some(-10.0..=10.0), 11));
        let detailed = intersect_detailed(&segments, 0.0);

        for (&edge, intersections) in &detailed {
            for window in intersections.windows(2) {
                assert!(window[0].t <= window[1].t);
            }
            for intersection in intersections {
                let other = intersection.other(edge).unwrap();
                assert!(detailed[&other]
                    .iter()
                    .any(|mirrored| mirrored.position == intersection.position));
            }
        }
    }
}
