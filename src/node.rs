use crate::utils::types::VertexIdx;
use core::fmt;

/// A triangle corner node.
///
/// A `casual node` has an index into the vertex list of the mesh.
///
/// A `conceptual node` stands for the missing apex of a degenerate triangle, i.e. a bare edge produced by the
/// divide and conquer base cases and by merges of collinear halves. Such triangles never appear in results.
///
/// A `deleted node` marks a triangle slot of the arena that has been removed.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum VertexNode {
    Casual(VertexIdx),
    Conceptual,
    Deleted,
}

impl VertexNode {
    /// Get the index of the node.
    #[must_use]
    pub const fn idx(&self) -> Option<VertexIdx> {
        match self {
            Self::Casual(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Check if the node is conceptual.
    #[must_use]
    pub const fn is_conceptual(&self) -> bool {
        matches!(self, Self::Conceptual)
    }

    /// Check if the node is deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for VertexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Casual(v_idx) => write!(f, "Casual({})", v_idx),
            Self::Conceptual => write!(f, "Conceptual"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_helpers() {
        assert_eq!(VertexNode::Casual(3).idx(), Some(3));
        assert_eq!(VertexNode::Conceptual.idx(), None);
        assert!(VertexNode::Conceptual.is_conceptual());
        assert!(VertexNode::Deleted.is_deleted());
        assert!(!VertexNode::Casual(0).is_deleted());
        assert_eq!(format!("{}", VertexNode::Casual(7)), "Casual(7)");
    }
}
