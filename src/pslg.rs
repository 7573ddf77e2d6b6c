//! Planar straight-line graphs, the input of the conforming triangulation.

use crate::{
    error::{GeometryError, Result},
    utils::{
        types::{Segment2, VertexIdx},
        vec2::Vec2,
    },
};

/// A planar straight-line graph: a vertex set plus constraint edges between vertices.
///
/// Edges are looked up by endpoint identity with [`Pslg::find_edge`] and by endpoint position with
/// [`Pslg::find_edge_by_position`]. Both directions of an edge denote the same edge.
///
/// ```
/// use tessel::{Pslg, Vec2};
///
/// let mut pslg = Pslg::new();
/// let a = pslg.add_point(Vec2::new(0.0, 0.0));
/// let b = pslg.add_point(Vec2::new(1.0, 0.0));
/// let e = pslg.add_edge(a, b).unwrap();
///
/// assert_eq!(pslg.add_edge(b, a).unwrap(), e);
/// assert!(pslg.add_edge(a, a).is_err());
/// assert!(pslg.contains_edge(Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pslg {
    vertices: Vec<Vec2>,
    edges: Vec<[VertexIdx; 2]>,
}

impl Pslg {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Builds a graph from segments, endpoints at tolerantly equal positions become one vertex.
    ///
    /// Fails with [`GeometryError::InvalidInput`] for a zero-length segment.
    pub fn from_segments(segments: &[Segment2]) -> Result<Self> {
        let mut pslg = Self::new();

        for &[p0, p1] in segments {
            let a = pslg.add_point(p0);
            let b = pslg.add_point(p1);
            pslg.add_edge(a, b)?;
        }

        Ok(pslg)
    }

    /// Adds a vertex, even if another vertex sits at the same position.
    pub fn add_vertex(&mut self, position: Vec2) -> VertexIdx {
        self.vertices.push(position);

        self.vertices.len() - 1
    }

    /// Adds a vertex unless one at a tolerantly equal position exists, returns the vertex at `position`.
    pub fn add_point(&mut self, position: Vec2) -> VertexIdx {
        self.find_vertex(position)
            .unwrap_or_else(|| self.add_vertex(position))
    }

    /// The first vertex at a tolerantly equal position.
    #[must_use]
    pub fn find_vertex(&self, position: Vec2) -> Option<VertexIdx> {
        self.vertices.iter().position(|&v| v == position)
    }

    /// Adds the constraint edge `a -> b` and returns its index.
    ///
    /// If the edge exists already, in either direction, its index is returned instead.
    pub fn add_edge(&mut self, a: VertexIdx, b: VertexIdx) -> Result<usize> {
        let (p0, p1) = match (self.vertices.get(a), self.vertices.get(b)) {
            (Some(&p0), Some(&p1)) => (p0, p1),
            _ => {
                return Err(GeometryError::invalid_input(format!(
                    "edge {} -> {} references a missing vertex",
                    a, b
                )))
            }
        };

        if a == b || p0 == p1 {
            return Err(GeometryError::invalid_input(format!(
                "zero-length edge between {} and {}",
                p0, p1
            )));
        }

        if let Some(e) = self.find_edge(a, b) {
            return Ok(e);
        }

        self.edges.push([a, b]);

        Ok(self.edges.len() - 1)
    }

    /// Find the edge connecting the vertices `a` and `b`, in any direction.
    #[must_use]
    pub fn find_edge(&self, a: VertexIdx, b: VertexIdx) -> Option<usize> {
        self.edges
            .iter()
            .position(|&[v0, v1]| (v0 == a && v1 == b) || (v0 == b && v1 == a))
    }

    /// Find an edge whose endpoints are at the positions `p0` and `p1`, in any direction.
    #[must_use]
    pub fn find_edge_by_position(&self, p0: Vec2, p1: Vec2) -> Option<usize> {
        self.segments()
            .iter()
            .position(|&[q0, q1]| (q0 == p0 && q1 == p1) || (q0 == p1 && q1 == p0))
    }

    #[must_use]
    pub fn contains_edge(&self, p0: Vec2, p1: Vec2) -> bool {
        self.find_edge_by_position(p0, p1).is_some()
    }

    /// Removes edge `e`, the following edges shift down by one. Vertices stay.
    pub fn remove_edge(&mut self, e: usize) -> Option<[VertexIdx; 2]> {
        (e < self.edges.len()).then(|| self.edges.remove(e))
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[must_use]
    pub fn edges(&self) -> &[[VertexIdx; 2]] {
        &self.edges
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The endpoint positions of edge `e`.
    #[must_use]
    pub fn segment(&self, e: usize) -> Option<Segment2> {
        let &[a, b] = self.edges.get(e)?;
        Some([self.vertices[a], self.vertices[b]])
    }

    /// The endpoint positions of all edges.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment2> {
        self.edges
            .iter()
            .map(|&[a, b]| [self.vertices[a], self.vertices[b]])
            .collect()
    }

    /// Vertices that are not an endpoint of any edge.
    #[must_use]
    pub fn free_vertices(&self) -> Vec<VertexIdx> {
        let mut used = vec![false; self.vertices.len()];
        for &[a, b] in &self.edges {
            used[a] = true;
            used[b] = true;
        }

        (0..self.vertices.len()).filter(|&v| !used[v]).collect()
    }
}
