use core::fmt;
use std::cmp::Ordering;

use crate::{
    utils::{
        convexity::{circumcircle, in_circumcircle, orientation},
        types::{EdgeIdx, TriIdx, Triangle2, VertexIdx},
        vec2::Vec2,
    },
    VertexNode,
};

use super::{edge_iterator::EdgeIterator, tri_data_structure::TriDataStructure};

/// A handle to a triangle of a triangulation data structure.
#[derive(Clone, Copy)]
pub struct TriIterator<'a> {
    pub tds: &'a TriDataStructure,
    pub idx: TriIdx,
}

impl<'a> TriIterator<'a> {
    pub const fn new(tds: &'a TriDataStructure, idx: TriIdx) -> Self {
        Self { tds, idx }
    }

    /// Returns the index of this.
    #[must_use]
    pub const fn idx(&self) -> TriIdx {
        self.idx
    }

    /// Get the nodes of this triangle, counter-clockwise.
    #[must_use]
    pub fn nodes(&self) -> [VertexNode; 3] {
        self.tds.tri_nodes[self.idx]
    }

    /// Check if the triangle is casual, i.e. a proper triangle with three vertices.
    #[must_use]
    pub fn is_casual(&self) -> bool {
        !self.is_conceptual() && !self.is_deleted()
    }

    /// Check if the triangle is conceptual, i.e. a bare edge without apex.
    #[must_use]
    pub fn is_conceptual(&self) -> bool {
        self.nodes().iter().any(VertexNode::is_conceptual)
    }

    /// Check if the triangle is deleted, i.e. one of the nodes is a deleted node, which means all nodes are deleted
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.nodes().iter().any(VertexNode::is_deleted)
    }

    /// The vertex indices of a casual triangle.
    #[must_use]
    pub fn vertices(&self) -> Option<[VertexIdx; 3]> {
        match self.nodes() {
            [VertexNode::Casual(a), VertexNode::Casual(b), VertexNode::Casual(c)] => Some([a, b, c]),
            _ => None,
        }
    }

    /// The vertex positions of a casual triangle.
    #[must_use]
    pub fn positions(&self) -> Option<Triangle2> {
        self.vertices()
            .map(|vertices| vertices.map(|v| self.tds.positions[v]))
    }

    /// The edges `e(v0, v1), e(v1, v2), e(v2, v0)`; a single edge for a conceptual triangle.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeIterator<'a>> {
        self.tds.tri_edges[self.idx]
            .iter()
            .flatten()
            .map(|&e| EdgeIterator::new(self.tds, e))
            .collect()
    }

    /// The vertex opposite to edge `e`.
    #[must_use]
    pub fn apex(&self, e: EdgeIdx) -> Option<VertexIdx> {
        let [v0, v1] = self.tds.edge_nodes[e];

        self.vertices()?
            .into_iter()
            .find(|&v| v != v0 && v != v1)
    }

    /// Check if `p` lies strictly inside the circumcircle.
    #[must_use]
    pub fn circumcircle_contains(&self, p: Vec2) -> bool {
        match self.positions() {
            Some([a, b, c]) => in_circumcircle(a, b, c, p),
            None => false,
        }
    }

    /// Center and radius of the circumcircle.
    #[must_use]
    pub fn circumcircle(&self) -> Option<(Vec2, f64)> {
        let [a, b, c] = self.positions()?;
        circumcircle(a, b, c)
    }

    /// Check if `p` lies inside the triangle or on its boundary.
    #[must_use]
    pub fn contains_point(&self, p: Vec2) -> bool {
        match self.positions() {
            Some([a, b, c]) => [(a, b), (b, c), (c, a)]
                .iter()
                .all(|&(from, to)| orientation(from, to, p) != Ordering::Less),
            None => false,
        }
    }

    /// Flippability of the three edges.
    #[must_use]
    pub fn can_flip(&self) -> [bool; 3] {
        let mut flippable = [false; 3];
        for (slot, edge) in flippable.iter_mut().zip(self.edges()) {
            *slot = edge.can_flip();
        }

        flippable
    }
}

impl fmt::Display for TriIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.nodes();
        write!(
            f,
            "Triangle {}: {} -> {} -> {}",
            self.idx(),
            nodes[0],
            nodes[1],
            nodes[2]
        )
    }
}
