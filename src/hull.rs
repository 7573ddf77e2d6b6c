//! Convex hull via Graham scan.

use crate::{
    trids::tri_data_structure::TriDataStructure,
    utils::{
        convexity::is_left_turn,
        point_order::cmp_positions,
        types::VertexIdx,
        vec2::Vec2,
    },
};

/// The convex hull of `points` as indices into `points`, counter-clockwise, starting at the lowest of the leftmost
/// points. Points on the hull boundary that are not corners are left out.
///
/// Fewer than four points are returned unchanged, in input order.
///
/// ```
/// use tessel::{convex_hull, Vec2};
///
/// let points = vec![
///     Vec2::new(0.0, 0.0),
///     Vec2::new(2.0, 2.0),
///     Vec2::new(1.0, 1.0),
///     Vec2::new(2.0, 0.0),
///     Vec2::new(0.0, 2.0),
/// ];
///
/// assert_eq!(convex_hull(&points), vec![0, 3, 1, 4]);
/// ```
#[must_use]
pub fn convex_hull(points: &[Vec2]) -> Vec<usize> {
    if points.len() < 4 {
        return (0..points.len()).collect();
    }

    let now = std::time::Instant::now();

    let mut anchor = 0;
    for idx in 1..points.len() {
        if cmp_positions(points[idx], points[anchor]).is_lt() {
            anchor = idx;
        }
    }
    let origin = points[anchor];

    let mut by_angle: Vec<usize> = (0..points.len())
        .filter(|&idx| idx != anchor && points[idx] != origin)
        .collect();
    let key = |idx: usize| {
        let d = points[idx] - origin;
        (d.y.atan2(d.x), d.squared_length())
    };
    by_angle.sort_by(|&a, &b| {
        let (angle_a, length_a) = key(a);
        let (angle_b, length_b) = key(b);
        angle_a
            .total_cmp(&angle_b)
            .then_with(|| length_a.total_cmp(&length_b))
    });

    let mut hull: Vec<usize> = Vec::with_capacity(by_angle.len() + 1);
    hull.push(anchor);
    for idx in by_angle {
        while hull.len() >= 2
            && !is_left_turn(
                points[hull[hull.len() - 2]],
                points[hull[hull.len() - 1]],
                points[idx],
            )
        {
            hull.pop();
        }
        hull.push(idx);
    }

    // points on the closing edge may end up sorted before the hull corner due to rounding
    while hull.len() >= 3
        && !is_left_turn(
            points[hull[hull.len() - 2]],
            points[hull[hull.len() - 1]],
            origin,
        )
    {
        hull.pop();
    }

    log::trace!(
        "Convex hull of {} points computed in {} µs",
        points.len(),
        now.elapsed().as_micros()
    );

    hull
}

/// The convex hull of a set of mesh vertices, see [`convex_hull`].
#[must_use]
pub fn convex_hull_vertices(tds: &TriDataStructure, vertices: &[VertexIdx]) -> Vec<VertexIdx> {
    let points: Vec<Vec2> = vertices.iter().map(|&v| tds.positions()[v]).collect();

    convex_hull(&points)
        .into_iter()
        .map(|idx| vertices[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{convexity::orientation, point_order::sort_lexicographic};
    use std::cmp::Ordering;
    use tessel_test_utils::sample_points_2d;

    /// Jarvis march, counter-clockwise from the lowest of the leftmost points.
    fn gift_wrapping(points: &[Vec2]) -> Vec<usize> {
        let all: Vec<usize> = (0..points.len()).collect();
        let start = sort_lexicographic(points, &all)[0];

        let mut hull = vec![start];
        let mut current = start;
        loop {
            let mut candidate = if current == 0 { 1 } else { 0 };
            for idx in 0..points.len() {
                if idx == current {
                    continue;
                }
                match orientation(points[current], points[candidate], points[idx]) {
                    Ordering::Less => candidate = idx,
                    Ordering::Equal
                        if points[current].distance(points[idx])
                            > points[current].distance(points[candidate]) =>
                    {
                        candidate = idx
                    }
                    _ => (),
                }
            }
            if candidate == start {
                break;
            }
            hull.push(candidate);
            current = candidate;
        }

        hull
    }

    #[test]
    fn test_tiny_sets_are_returned_unchanged() {
        let points = vec![Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0)];

        assert_eq!(convex_hull(&points), vec![0, 1, 2]);
        assert_eq!(convex_hull(&points[..2]), vec![0, 1]);
    }

    #[test]
    fn test_collinear_boundary_points_are_dropped() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(0.0, 1.0),
        ];

        assert_eq!(convex_hull(&points), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_angles_closer_than_tolerance() {
        let mut points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        // inner points whose angles to the anchor chain together in steps below the tolerance
        for j in 1..40 {
            let angle = std::f64::consts::FRAC_PI_4 + (j as f64 - 20.0) * 0.6e-12;
            let radius = 0.5 + ((j * 37) % 40) as f64 / 16.0;
            points.push(Vec2::new(radius * angle.cos(), radius * angle.sin()));
        }

        assert_eq!(convex_hull(&points), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_matches_gift_wrapping() {
        for n in [4, 10, 50, 100, 500] {
            let points: Vec<Vec2> = sample_points_2d(n, None)
                .into_iter()
                .map(Vec2::from)
                .collect();

            assert_eq!(convex_hull(&points), gift_wrapping(&points));
        }
    }

    #[test]
    fn test_hull_of_triangulation_boundary() {
        let points: Vec<Vec2> = sample_points_2d(200, None)
            .into_iter()
            .map(Vec2::from)
            .collect();
        let triangulation = crate::Triangulation::new(&points).unwrap();

        let boundary = triangulation.tds.boundary_vertices();

        assert_eq!(
            convex_hull_vertices(&triangulation.tds, &boundary),
            gift_wrapping(&points)
        );
        assert_eq!(triangulation.convex_hull(), gift_wrapping(&points));
    }

    #[test]
    fn test_hull_of_mesh_vertices() {
        let mut tds = TriDataStructure::new();
        let vertices: Vec<VertexIdx> = [(3.0, 3.0), (0.0, 0.0), (1.0, 1.0), (3.0, 0.0), (0.0, 3.0)]
            .into_iter()
            .map(|p| tds.add_vertex(Vec2::from(p)))
            .collect();

        assert_eq!(convex_hull_vertices(&tds, &vertices[1..]), vec![1, 3, 4]);
        assert_eq!(convex_hull_vertices(&tds, &vertices), vec![1, 3, 0, 4]);
    }
}
