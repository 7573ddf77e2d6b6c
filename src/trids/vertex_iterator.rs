use crate::utils::{types::VertexIdx, vec2::Vec2};

use super::{edge_iterator::EdgeIterator, tri_data_structure::TriDataStructure};

/// A handle to a vertex of a triangulation data structure.
#[derive(Clone, Copy)]
pub struct VertexIterator<'a> {
    pub tds: &'a TriDataStructure,
    pub idx: VertexIdx,
}

impl<'a> VertexIterator<'a> {
    pub const fn new(tds: &'a TriDataStructure, idx: VertexIdx) -> Self {
        Self { tds, idx }
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.tds.positions[self.idx]
    }

    /// The incident edges, sorted by their outgoing angle from this vertex, then by length.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeIterator<'a>> {
        self.tds.vertex_edges[self.idx]
            .iter()
            .map(|&e| EdgeIterator::new(self.tds, e))
            .collect()
    }

    /// The adjacent vertices, in the order of [`Self::edges`].
    #[must_use]
    pub fn neighbors(&self) -> Vec<VertexIdx> {
        self.edges()
            .iter()
            .filter_map(|edge| edge.other(self.idx))
            .collect()
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.tds.vertex_edges[self.idx].len()
    }
}
