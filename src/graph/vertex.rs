use std::fmt;

use super::EdgeId;
use crate::math::Point2;

/// Unique identifier for a corridor graph vertex.
///
/// Ids are allocated from a per-graph monotonic counter and never reused
/// after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub(crate) u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A vertex of the corridor graph.
///
/// Owns the list of outgoing half-edges; an isolated vertex (empty edge
/// list) is never present in the live graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position of the vertex.
    pub position: Point2,
    /// Outgoing half-edges, ascending by id.
    pub edges: Vec<EdgeId>,
    /// Whether the vertex coincides with obstacle geometry (zero
    /// clearance).
    pub is_boundary: bool,
    /// Whether the vertex was spliced onto a patch boundary during an
    /// incremental update.
    pub is_linked: bool,
}

impl Vertex {
    pub(crate) fn new(position: Point2) -> Self {
        Self {
            position,
            edges: Vec::new(),
            is_boundary: false,
            is_linked: false,
        }
    }
}
