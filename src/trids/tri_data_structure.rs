use std::{cmp::Ordering, f64::consts::TAU};

use super::{edge_iterator::EdgeIterator, tri_iterator::TriIterator, vertex_iterator::VertexIterator};
use crate::{
    error::GeometryError,
    utils::{
        compare::{compare, TOLERANCE},
        convexity::orientation,
        types::{EdgeIdx, TriIdx, VertexIdx},
        vec2::Vec2,
    },
    VertexNode,
};

use anyhow::{Ok as HowOk, Result as HowResult};
use log::error;

/// An edge has at most this many adjacent triangles.
const MAX_ADJACENT_TRIS: usize = 2;

/// A 2D mesh of vertices, edges and triangles, stored as an arena.
///
/// All entities are addressed by stable indices. Removing an edge or a triangle marks its slot inactive instead of
/// shifting the following entries, so indices held by callers stay valid (they may point to a removed slot though).
///
/// ```ignore
/// vertex  --> incident edges, sorted by outgoing angle, then length
/// edge    --> [v0, v1], length, direction, adjacent triangles (at most two)
/// tri     --> [v0, v1, v2] counter-clockwise, edges [e(v0, v1), e(v1, v2), e(v2, v0)]
/// ```
//
// A degenerate triangle is a bare edge: its third node is `Conceptual` and only its first edge is set.
#[derive(Debug, Clone, Default)]
pub struct TriDataStructure {
    pub(crate) positions: Vec<Vec2>,
    pub(crate) vertex_edges: Vec<Vec<EdgeIdx>>,
    pub(crate) edge_nodes: Vec<[VertexIdx; 2]>,
    pub(crate) edge_lengths: Vec<f64>,
    pub(crate) edge_directions: Vec<Vec2>,
    pub(crate) edge_tris: Vec<Vec<TriIdx>>,
    pub(crate) edge_active: Vec<bool>,
    pub(crate) tri_nodes: Vec<[VertexNode; 3]>,
    pub(crate) tri_edges: Vec<[Option<EdgeIdx>; 3]>,
    pub num_tris: usize,
    /// The number of deleted triangles.
    pub num_deleted_tris: usize,
    pub num_edges: usize,
    pub num_deleted_edges: usize,
}

impl TriDataStructure {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            vertex_edges: Vec::new(),
            edge_nodes: Vec::new(),
            edge_lengths: Vec::new(),
            edge_directions: Vec::new(),
            edge_tris: Vec::new(),
            edge_active: Vec::new(),
            tri_nodes: Vec::new(),
            tri_edges: Vec::new(),
            num_tris: 0,
            num_deleted_tris: 0,
            num_edges: 0,
            num_deleted_edges: 0,
        }
    }

    /// Add an isolated vertex.
    pub fn add_vertex(&mut self, position: Vec2) -> VertexIdx {
        self.positions.push(position);
        self.vertex_edges.push(Vec::new());

        self.positions.len() - 1
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// The number of triangles, including degenerate ones.
    #[must_use]
    pub const fn num_tris(&self) -> usize {
        self.num_tris
    }

    /// The number of non-degenerate triangles.
    #[must_use]
    pub fn num_casual_tris(&self) -> usize {
        self.tris().filter(TriIterator::is_casual).count()
    }

    #[must_use]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn get_vertex(&self, idx: VertexIdx) -> HowResult<VertexIterator<'_>> {
        if idx >= self.positions.len() {
            return Err(anyhow::Error::msg("Vertex index out of bounds!"));
        }

        HowOk(VertexIterator::new(self, idx))
    }

    pub fn get_edge(&self, idx: EdgeIdx) -> HowResult<EdgeIterator<'_>> {
        if idx >= self.edge_nodes.len() {
            return Err(anyhow::Error::msg("Edge index out of bounds!"));
        }

        HowOk(EdgeIterator::new(self, idx))
    }

    pub fn get_tri(&self, idx: TriIdx) -> HowResult<TriIterator<'_>> {
        if idx >= self.tri_nodes.len() {
            return Err(anyhow::Error::msg("Tri index out of bounds!"));
        }

        HowOk(TriIterator::new(self, idx))
    }

    /// All triangles that have not been removed, degenerate ones included.
    pub fn tris(&self) -> impl Iterator<Item = TriIterator<'_>> + '_ {
        (0..self.tri_nodes.len())
            .map(|idx| TriIterator::new(self, idx))
            .filter(|tri| !tri.is_deleted())
    }

    /// All non-degenerate triangles that have not been removed.
    pub fn casual_tris(&self) -> impl Iterator<Item = TriIterator<'_>> + '_ {
        self.tris().filter(TriIterator::is_casual)
    }

    /// All edges that have not been removed.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIterator<'_>> + '_ {
        (0..self.edge_nodes.len())
            .filter(|&idx| self.edge_active[idx])
            .map(|idx| EdgeIterator::new(self, idx))
    }

    /// Find the edge connecting `a` and `b`, in any direction.
    #[must_use]
    pub fn find_edge(&self, a: VertexIdx, b: VertexIdx) -> Option<EdgeIdx> {
        self.vertex_edges.get(a)?.iter().copied().find(|&e| {
            let [v0, v1] = self.edge_nodes[e];
            (v0 == a && v1 == b) || (v0 == b && v1 == a)
        })
    }

    /// Outgoing angle of edge `e` seen from its endpoint `v`, in `[0, 2π)`.
    pub(crate) fn edge_angle_from(&self, e: EdgeIdx, v: VertexIdx) -> f64 {
        let [v0, _] = self.edge_nodes[e];
        let direction = if v0 == v {
            self.edge_directions[e]
        } else {
            -self.edge_directions[e]
        };

        let angle = direction.y.atan2(direction.x);
        if angle < 0.0 {
            angle + TAU
        } else {
            angle
        }
    }

    fn cmp_incident_edges(&self, v: VertexIdx, e0: EdgeIdx, e1: EdgeIdx) -> Ordering {
        compare(
            self.edge_angle_from(e0, v),
            self.edge_angle_from(e1, v),
            TOLERANCE,
        )
        .then_with(|| compare(self.edge_lengths[e0], self.edge_lengths[e1], TOLERANCE))
        .then_with(|| e0.cmp(&e1))
    }

    fn insert_incident_edge(&mut self, v: VertexIdx, e: EdgeIdx) {
        let position = self.vertex_edges[v]
            .partition_point(|&other| self.cmp_incident_edges(v, other, e) == Ordering::Less);
        self.vertex_edges[v].insert(position, e);
    }

    /// Find the edge connecting `a` and `b` or create it.
    ///
    /// Fails with [`GeometryError::InvalidInput`] for coinciding endpoints.
    pub fn add_edge(&mut self, a: VertexIdx, b: VertexIdx) -> HowResult<EdgeIdx> {
        if a >= self.positions.len() || b >= self.positions.len() {
            return Err(anyhow::Error::msg("Vertex index out of bounds!"));
        }

        if let Some(e) = self.find_edge(a, b) {
            return HowOk(e);
        }

        let (p0, p1) = (self.positions[a], self.positions[b]);
        if a == b || p0 == p1 {
            return Err(GeometryError::invalid_input(format!(
                "zero-length edge between {} and {}",
                p0, p1
            ))
            .into());
        }

        let length = p0.distance(p1);
        let e = self.edge_nodes.len();

        self.edge_nodes.push([a, b]);
        self.edge_lengths.push(length);
        self.edge_directions.push((p1 - p0) / length);
        self.edge_tris.push(Vec::new());
        self.edge_active.push(true);
        self.num_edges += 1;

        self.insert_incident_edge(a, e);
        self.insert_incident_edge(b, e);

        HowOk(e)
    }

    fn check_free_side(&self, e: EdgeIdx) -> HowResult<()> {
        if self.edge_tris[e].len() >= MAX_ADJACENT_TRIS {
            return Err(anyhow::Error::msg(format!(
                "Edge {} already has two adjacent triangles!",
                e
            )));
        }

        HowOk(())
    }

    /// Add the triangle `abc`, stored counter-clockwise.
    ///
    /// Existing edges between the vertices are reused and lose their degenerate triangles.
    pub fn add_tri(&mut self, a: VertexIdx, b: VertexIdx, c: VertexIdx) -> HowResult<TriIdx> {
        if a == b || b == c || c == a {
            return Err(GeometryError::invalid_input("triangle with repeated vertices").into());
        }
        if a.max(b).max(c) >= self.positions.len() {
            return Err(anyhow::Error::msg("Vertex index out of bounds!"));
        }

        let (b, c) = match orientation(self.positions[a], self.positions[b], self.positions[c]) {
            Ordering::Greater => (b, c),
            Ordering::Less => (c, b),
            Ordering::Equal => {
                return Err(GeometryError::invalid_input(format!(
                    "collinear triangle {} -> {} -> {}",
                    self.positions[a], self.positions[b], self.positions[c]
                ))
                .into())
            }
        };

        let edges = [self.add_edge(a, b)?, self.add_edge(b, c)?, self.add_edge(c, a)?];
        for e in edges {
            self.remove_degenerate_tris(e)?;
        }

        for e in edges {
            self.check_free_side(e)?;
        }

        let t = self.tri_nodes.len();
        for e in edges {
            self.edge_tris[e].push(t);
        }

        self.tri_nodes.push([
            VertexNode::Casual(a),
            VertexNode::Casual(b),
            VertexNode::Casual(c),
        ]);
        self.tri_edges.push([Some(edges[0]), Some(edges[1]), Some(edges[2])]);
        self.num_tris += 1;

        HowOk(t)
    }

    /// Add a degenerate triangle, i.e. the bare edge `ab`.
    pub fn add_degenerate_tri(&mut self, a: VertexIdx, b: VertexIdx) -> HowResult<TriIdx> {
        let e = self.add_edge(a, b)?;

        self.check_free_side(e)?;

        let t = self.tri_nodes.len();
        self.edge_tris[e].push(t);

        self.tri_nodes.push([
            VertexNode::Casual(a),
            VertexNode::Casual(b),
            VertexNode::Conceptual,
        ]);
        self.tri_edges.push([Some(e), None, None]);
        self.num_tris += 1;

        HowOk(t)
    }

    /// Remove a triangle, its edges stay.
    pub fn remove_tri(&mut self, t: TriIdx) -> HowResult<()> {
        if t >= self.tri_nodes.len() {
            return Err(anyhow::Error::msg("Tri index out of bounds!"));
        }
        if self.tri_nodes[t][0].is_deleted() {
            return HowOk(());
        }

        for e in self.tri_edges[t].into_iter().flatten() {
            self.edge_tris[e].retain(|&other| other != t);
        }

        self.tri_nodes[t] = [VertexNode::Deleted; 3];
        self.tri_edges[t] = [None; 3];
        self.num_tris -= 1;
        self.num_deleted_tris += 1;

        HowOk(())
    }

    /// Remove an edge together with its adjacent triangles.
    pub fn remove_edge(&mut self, e: EdgeIdx) -> HowResult<()> {
        if e >= self.edge_nodes.len() {
            return Err(anyhow::Error::msg("Edge index out of bounds!"));
        }
        if !self.edge_active[e] {
            return HowOk(());
        }

        for t in self.edge_tris[e].clone() {
            self.remove_tri(t)?;
        }

        let [a, b] = self.edge_nodes[e];
        self.vertex_edges[a].retain(|&other| other != e);
        self.vertex_edges[b].retain(|&other| other != e);

        self.edge_active[e] = false;
        self.num_edges -= 1;
        self.num_deleted_edges += 1;

        HowOk(())
    }

    /// Remove all degenerate triangles that consist of edge `e` only.
    pub fn remove_degenerate_tris(&mut self, e: EdgeIdx) -> HowResult<()> {
        let degenerate: Vec<TriIdx> = self.edge_tris[e]
            .iter()
            .copied()
            .filter(|&t| self.tri_nodes[t][2].is_conceptual())
            .collect();

        for t in degenerate {
            self.remove_tri(t)?;
        }

        HowOk(())
    }

    /// Remove all degenerate triangles of the mesh.
    pub fn remove_all_degenerate_tris(&mut self) -> HowResult<usize> {
        let degenerate: Vec<TriIdx> = self
            .tris()
            .filter(TriIterator::is_conceptual)
            .map(|tri| tri.idx)
            .collect();

        for &t in &degenerate {
            self.remove_tri(t)?;
        }

        HowOk(degenerate.len())
    }

    /// Replace edge `e` by the other diagonal of the quadrilateral formed by its two triangles.
    ///
    /// ```ignore
    ///       p                 p
    ///     /   \             / | \
    ///    a --- b    -->    a  |  b
    ///     \   /             \ | /
    ///       q                 q
    /// ```
    ///
    /// Fails if the edge cannot be flipped, see [`EdgeIterator::can_flip`]. Returns the new edge.
    pub fn flip_edge(&mut self, e: EdgeIdx) -> HowResult<EdgeIdx> {
        let edge = self.get_edge(e)?;
        let [a, b] = edge.vertices();
        let [p, q] = edge
            .flipped_diagonal()
            .ok_or_else(|| anyhow::Error::msg(format!("Edge {} cannot be flipped!", e)))?;

        self.remove_edge(e)?;
        self.add_tri(a, q, p)?;
        self.add_tri(b, p, q)?;

        self.find_edge(p, q)
            .ok_or_else(|| anyhow::Error::msg("Flipped edge is missing!"))
    }

    /// Vertices on edges with exactly one adjacent non-degenerate triangle, sorted by index.
    #[must_use]
    pub fn boundary_vertices(&self) -> Vec<VertexIdx> {
        let mut boundary: Vec<VertexIdx> = self
            .edges()
            .filter(|edge| edge.casual_tris().len() == 1)
            .flat_map(|edge| edge.vertices())
            .collect();

        boundary.sort_unstable();
        boundary.dedup();

        boundary
    }

    /// Check the structural invariants: no zero-length edges, counter-clockwise non-degenerate triangles,
    /// every edge registered at both endpoints and at most two triangles per edge.
    #[must_use]
    pub fn is_sound(&self) -> bool {
        let mut sound = true;

        let mut check = |condition: bool, error_msg: &str| {
            if !condition {
                error!("{error_msg}");
                sound = false;
            }
        };

        for edge in self.edges() {
            let [a, b] = edge.vertices();
            check(
                self.positions[a] != self.positions[b],
                &format!("Edge {} has zero length", edge.idx),
            );
            check(
                self.vertex_edges[a].contains(&edge.idx) && self.vertex_edges[b].contains(&edge.idx),
                &format!("Edge {} is missing in the incidence of its vertices", edge.idx),
            );
            check(
                self.edge_tris[edge.idx].len() <= MAX_ADJACENT_TRIS,
                &format!("Edge {} has more than two triangles", edge.idx),
            );
            for tri in edge.tris() {
                check(
                    !tri.is_deleted() && tri.edges().iter().any(|other| other.idx == edge.idx),
                    &format!("Edge {} references a foreign triangle {}", edge.idx, tri.idx),
                );
            }
        }

        for tri in self.tris() {
            let edges = tri.edges();
            check(
                edges.iter().all(|edge| edge.is_active()),
                &format!("{tri} references a removed edge"),
            );
            if let Some([a, b, c]) = tri.vertices() {
                check(
                    orientation(self.positions[a], self.positions[b], self.positions[c])
                        == Ordering::Greater,
                    &format!("{tri} is not counter-clockwise"),
                );
                check(edges.len() == 3, &format!("{tri} does not have three edges"));
            }
        }

        for v in 0..self.positions.len() {
            let incident = &self.vertex_edges[v];
            check(
                incident.iter().all(|&e| self.edge_active[e]),
                &format!("Vertex {} references a removed edge", v),
            );
            check(
                incident
                    .windows(2)
                    .all(|pair| self.cmp_incident_edges(v, pair[0], pair[1]) != Ordering::Greater),
                &format!("Incident edges of vertex {} are not sorted by angle", v),
            );
        }

        sound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (TriDataStructure, [VertexIdx; 4]) {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(1.0, 0.0));
        let c = tds.add_vertex(Vec2::new(1.0, 1.0));
        let d = tds.add_vertex(Vec2::new(0.0, 1.0));

        tds.add_tri(a, b, c).unwrap();
        tds.add_tri(a, c, d).unwrap();

        (tds, [a, b, c, d])
    }

    #[test]
    fn test_add_tri_shares_edges() {
        let (tds, [a, _, c, _]) = square();

        assert_eq!(tds.num_tris(), 2);
        assert_eq!(tds.num_edges(), 5);
        let diagonal = tds.find_edge(c, a).unwrap();
        assert_eq!(tds.get_edge(diagonal).unwrap().tris().len(), 2);
        assert!(tds.is_sound());
    }

    #[test]
    fn test_add_tri_canonicalizes_winding() {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(0.0, 1.0));
        let c = tds.add_vertex(Vec2::new(1.0, 0.0));

        let t = tds.add_tri(a, b, c).unwrap();

        assert_eq!(tds.get_tri(t).unwrap().vertices(), Some([a, c, b]));
        assert!(tds.is_sound());
    }

    #[test]
    fn test_reject_degenerate_input() {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(0.0, 0.0));
        let c = tds.add_vertex(Vec2::new(1.0, 1.0));
        let d = tds.add_vertex(Vec2::new(2.0, 2.0));

        let err = GeometryError::from(tds.add_edge(a, b).unwrap_err());
        assert!(err.is_invalid_input());

        let err = GeometryError::from(tds.add_tri(a, c, d).unwrap_err());
        assert!(err.is_invalid_input());

        assert!(tds.get_tri(0).is_err());
    }

    #[test]
    fn test_incident_edges_sorted_by_angle() {
        let mut tds = TriDataStructure::new();
        let center = tds.add_vertex(Vec2::new(0.0, 0.0));
        let targets = [
            Vec2::new(0.0, -1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(2.0, 0.0),
        ];
        for p in targets {
            let v = tds.add_vertex(p);
            tds.add_edge(center, v).unwrap();
        }

        let order: Vec<VertexIdx> = tds
            .get_vertex(center)
            .unwrap()
            .neighbors();

        // east (short, long), north, west, south
        assert_eq!(order, vec![3, 5, 4, 2, 1]);
        assert!(tds.is_sound());
    }

    #[test]
    fn test_degenerate_tri_is_replaced() {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(1.0, 0.0));
        let c = tds.add_vertex(Vec2::new(0.0, 1.0));

        let degenerate = tds.add_degenerate_tri(a, b).unwrap();
        assert!(tds.get_tri(degenerate).unwrap().is_conceptual());
        assert_eq!(tds.num_casual_tris(), 0);

        tds.add_tri(a, b, c).unwrap();

        assert!(tds.get_tri(degenerate).unwrap().is_deleted());
        assert_eq!(tds.num_tris(), 1);
        assert_eq!(tds.num_casual_tris(), 1);
        assert!(tds.is_sound());
    }

    #[test]
    fn test_remove_edge_removes_tris() {
        let (mut tds, [a, _, c, _]) = square();
        let diagonal = tds.find_edge(a, c).unwrap();

        tds.remove_edge(diagonal).unwrap();

        assert_eq!(tds.num_tris(), 0);
        assert_eq!(tds.num_deleted_tris, 2);
        assert_eq!(tds.num_edges(), 4);
        assert!(tds.find_edge(a, c).is_none());
        assert!(tds.is_sound());
    }

    #[test]
    fn test_flip_edge() {
        let (mut tds, [a, b, c, d]) = square();
        let diagonal = tds.find_edge(a, c).unwrap();

        let flipped = tds.flip_edge(diagonal).unwrap();
        let edge = tds.get_edge(flipped).unwrap();

        let mut nodes = edge.vertices();
        nodes.sort_unstable();
        assert_eq!(nodes, [b, d]);
        assert_eq!(edge.casual_tris().len(), 2);
        assert_eq!(tds.num_casual_tris(), 2);
        assert!(tds.find_edge(a, c).is_none());
        assert!(tds.is_sound());
    }

    #[test]
    fn test_flip_rejects_hull_edge() {
        let (mut tds, [a, b, _, _]) = square();
        let hull_edge = tds.find_edge(a, b).unwrap();

        assert!(tds.flip_edge(hull_edge).is_err());
    }

    #[test]
    fn test_boundary_vertices() {
        let mut tds = TriDataStructure::new();
        let a = tds.add_vertex(Vec2::new(0.0, 0.0));
        let b = tds.add_vertex(Vec2::new(2.0, 0.0));
        let c = tds.add_vertex(Vec2::new(1.0, 2.0));
        let m = tds.add_vertex(Vec2::new(1.0, 0.5));

        tds.add_tri(a, b, m).unwrap();
        tds.add_tri(b, c, m).unwrap();
        tds.add_tri(c, a, m).unwrap();

        assert_eq!(tds.boundary_vertices(), vec![a, b, c]);
    }
}
