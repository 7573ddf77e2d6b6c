use std::cmp::Ordering;

use super::{
    compare::{almost_equal, compare, TOLERANCE},
    types::VertexIdx,
    vec2::Vec2,
};

/// Tolerant lexicographic order on positions, x first then y.
#[must_use]
pub fn cmp_positions(a: Vec2, b: Vec2) -> Ordering {
    compare(a.x, b.x, TOLERANCE).then_with(|| compare(a.y, b.y, TOLERANCE))
}

/// Sorts vertex indices by the position of the vertices, x first then y.
///
/// The order is total: vertices are sorted by their exact x-coordinate, then every run of vertices whose
/// x-coordinates chain together within the relative tolerance is treated as one column and sorted by y.
/// Tolerantly collinear vertices on an almost vertical line thereby come out in their order along the line.
pub fn sort_lexicographic(positions: &[Vec2], indices: &[VertexIdx]) -> Vec<VertexIdx> {
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&a, &b| {
        let (pa, pb) = (positions[a], positions[b]);
        pa.x.total_cmp(&pb.x).then_with(|| pa.y.total_cmp(&pb.y))
    });

    let mut start = 0;
    for end in 1..=sorted.len() {
        if end < sorted.len()
            && almost_equal(positions[sorted[end - 1]].x, positions[sorted[end]].x, TOLERANCE)
        {
            continue;
        }

        sorted[start..end].sort_by(|&a, &b| {
            let (pa, pb) = (positions[a], positions[b]);
            pa.y.total_cmp(&pb.y).then_with(|| pa.x.total_cmp(&pb.x))
        });
        start = end;
    }

    sorted
}

/// A position usable as key of ordered maps, ordered by [`cmp_positions`].
///
/// Keys closer than the relative tolerance collapse onto the same entry.
#[derive(Clone, Copy, Debug)]
pub struct PositionKey(pub Vec2);

impl PartialEq for PositionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PositionKey {}

impl PartialOrd for PositionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PositionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_positions(self.0, other.0)
    }
}
