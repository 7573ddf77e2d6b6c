use core::fmt;

use crate::utils::{
    convexity::in_circumcircle,
    segment::segments_cross,
    types::{EdgeIdx, Segment2, TriIdx, VertexIdx},
    vec2::Vec2,
};

use super::{tri_data_structure::TriDataStructure, tri_iterator::TriIterator};

/// A handle to an edge of a triangulation data structure.
#[derive(Clone, Copy)]
pub struct EdgeIterator<'a> {
    pub tds: &'a TriDataStructure,
    /// The edge idx of this iterator
    pub idx: EdgeIdx,
}

impl<'a> EdgeIterator<'a> {
    pub const fn new(tds: &'a TriDataStructure, idx: EdgeIdx) -> Self {
        Self { tds, idx }
    }

    #[must_use]
    pub fn vertices(&self) -> [VertexIdx; 2] {
        self.tds.edge_nodes[self.idx]
    }

    #[must_use]
    pub fn v0(&self) -> VertexIdx {
        self.vertices()[0]
    }

    #[must_use]
    pub fn v1(&self) -> VertexIdx {
        self.vertices()[1]
    }

    /// The endpoint that is not `v`, `None` if `v` is no endpoint.
    #[must_use]
    pub fn other(&self, v: VertexIdx) -> Option<VertexIdx> {
        match self.vertices() {
            [v0, v1] if v0 == v => Some(v1),
            [v0, v1] if v1 == v => Some(v0),
            _ => None,
        }
    }

    #[must_use]
    pub fn positions(&self) -> Segment2 {
        let [v0, v1] = self.vertices();
        [self.tds.positions[v0], self.tds.positions[v1]]
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.tds.edge_lengths[self.idx]
    }

    /// Unit vector from `v0` to `v1`.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        self.tds.edge_directions[self.idx]
    }

    #[must_use]
    pub fn midpoint(&self) -> Vec2 {
        let [p0, p1] = self.positions();
        p0.lerp(p1, 0.5)
    }

    /// Outgoing angle of the edge seen from endpoint `v`, in `[0, 2π)`.
    #[must_use]
    pub fn angle_from(&self, v: VertexIdx) -> f64 {
        self.tds.edge_angle_from(self.idx, v)
    }

    /// Check if the edge has not been removed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tds.edge_active[self.idx]
    }

    /// The adjacent triangles, degenerate ones included.
    #[must_use]
    pub fn tris(&self) -> Vec<TriIterator<'a>> {
        self.tds.edge_tris[self.idx]
            .iter()
            .map(|&t| TriIterator::new(self.tds, t))
            .collect()
    }

    /// The adjacent non-degenerate triangles.
    #[must_use]
    pub fn casual_tris(&self) -> Vec<TriIterator<'a>> {
        self.tris().into_iter().filter(TriIterator::is_casual).collect()
    }

    /// The apex of the adjacent triangle other than `tri`.
    ///
    /// For an edge with a single adjacent triangle (a hull edge) this is the apex of `tri` itself.
    #[must_use]
    pub fn opposite_vertex(&self, tri: TriIdx) -> Option<VertexIdx> {
        let tris = self.casual_tris();

        match tris.as_slice() {
            [only] => only.apex(self.idx),
            [t0, t1] if t0.idx == tri => t1.apex(self.idx),
            [t0, t1] if t1.idx == tri => t0.apex(self.idx),
            _ => None,
        }
    }

    /// The diagonal a flip would create, i.e. the apexes of both adjacent triangles.
    ///
    /// `None` if the edge cannot be flipped.
    #[must_use]
    pub fn flipped_diagonal(&self) -> Option<[VertexIdx; 2]> {
        let tris = self.casual_tris();
        let [t0, t1] = tris.as_slice() else {
            return None;
        };

        let p = t0.apex(self.idx)?;
        let q = t1.apex(self.idx)?;
        let [a, b] = self.positions();

        segments_cross(a, b, self.tds.positions[p], self.tds.positions[q]).then_some([p, q])
    }

    /// Check if the edge can be flipped, i.e. it has two adjacent non-degenerate triangles forming a strictly
    /// convex quadrilateral.
    #[must_use]
    pub fn can_flip(&self) -> bool {
        self.flipped_diagonal().is_some()
    }

    /// Check if the edge is locally Delaunay: the apex of one adjacent triangle is not strictly inside the
    /// circumcircle of the other.
    #[must_use]
    pub fn is_delaunay(&self) -> bool {
        let tris = self.casual_tris();
        let [t0, t1] = tris.as_slice() else {
            return true;
        };

        match (t0.positions(), t1.apex(self.idx)) {
            (Some([a, b, c]), Some(q)) => !in_circumcircle(a, b, c, self.tds.positions[q]),
            _ => true,
        }
    }
}

impl fmt::Display for EdgeIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [v0, v1] = self.vertices();
        write!(f, "Edge {}: {} -> {}", self.idx, v0, v1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles over the diagonal `(0, 0) -- (1, 1)` of the square, plus the apex `(-0.5, 3.0)` above.
    fn fixture() -> (TriDataStructure, [VertexIdx; 5]) {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(1.0, 0.0));
        let c = tds.add_vertex(Vec2::new(1.0, 1.0));
        let d = tds.add_vertex(Vec2::new(0.0, 1.0));
        let e = tds.add_vertex(Vec2::new(-0.5, 3.0));

        tds.add_tri(a, b, c).unwrap();
        tds.add_tri(a, c, d).unwrap();
        tds.add_tri(d, c, e).unwrap();

        (tds, [a, b, c, d, e])
    }

    #[test]
    fn test_basic_queries() {
        let (tds, [a, _, c, _, _]) = fixture();
        let edge = tds.get_edge(tds.find_edge(a, c).unwrap()).unwrap();

        assert!((edge.length() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(edge.midpoint(), Vec2::new(0.5, 0.5));
        assert_eq!(edge.other(a), Some(c));
        assert_eq!(edge.other(c), Some(a));
        assert_eq!(edge.other(42), None);
        assert_eq!(edge.tris().len(), 2);
    }

    #[test]
    fn test_opposite_vertex() {
        let (tds, [a, b, c, d, _]) = fixture();
        let diagonal = tds.get_edge(tds.find_edge(a, c).unwrap()).unwrap();
        let tris = diagonal.tris();

        let opposite0 = diagonal.opposite_vertex(tris[0].idx).unwrap();
        let opposite1 = diagonal.opposite_vertex(tris[1].idx).unwrap();
        let mut both = [opposite0, opposite1];
        both.sort_unstable();
        assert_eq!(both, [b, d]);

        // a hull edge reports the apex of its only triangle
        let hull = tds.get_edge(tds.find_edge(a, b).unwrap()).unwrap();
        assert_eq!(hull.opposite_vertex(hull.tris()[0].idx), Some(c));
    }

    #[test]
    fn test_can_flip() {
        let (tds, [a, b, c, d, e]) = fixture();

        // convex quadrilateral
        assert!(tds.get_edge(tds.find_edge(a, c).unwrap()).unwrap().can_flip());
        // hull edge
        assert!(!tds.get_edge(tds.find_edge(a, b).unwrap()).unwrap().can_flip());
        // the quadrilateral a, c, e, d is not convex at d
        assert!(!tds.get_edge(tds.find_edge(c, d).unwrap()).unwrap().can_flip());
        assert!(tds.find_edge(b, e).is_none());
    }

    #[test]
    fn test_is_delaunay() {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(4.0, 0.0));
        let c = tds.add_vertex(Vec2::new(2.0, 0.5));
        let d = tds.add_vertex(Vec2::new(2.0, -0.5));

        // the long edge a -- b is not Delaunay for this flat quadrilateral
        tds.add_tri(a, b, c).unwrap();
        tds.add_tri(a, d, b).unwrap();
        let long = tds.find_edge(a, b).unwrap();
        assert!(!tds.get_edge(long).unwrap().is_delaunay());

        let short = tds.flip_edge(long).unwrap();
        assert!(tds.get_edge(short).unwrap().is_delaunay());
        assert!(tds.is_sound());
    }
}
