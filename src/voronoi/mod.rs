pub mod delaunay;

pub use delaunay::DelaunaySource;

use crate::error::{GraphError, Result};
use crate::graph::ObstacleId;
use crate::math::distance_2d::point_to_segment_dist;
use crate::math::Point2;

/// An obstacle feature generating Voronoi cells.
///
/// Every place a site is referenced matches this union exhaustively;
/// there is no common base type.
#[derive(Debug, Clone, PartialEq)]
pub enum Site {
    /// An isolated point obstacle.
    Point(Point2),
    /// An oriented obstacle segment, optionally owned by a polygonal
    /// parent obstacle.
    Segment {
        start: Point2,
        end: Point2,
        parent: Option<ObstacleId>,
    },
}

impl Site {
    /// Returns the category of this site.
    #[must_use]
    pub fn kind(&self) -> SiteKind {
        match self {
            Self::Point(_) => SiteKind::Point,
            Self::Segment { .. } => SiteKind::Segment,
        }
    }

    /// Distance from the site geometry to a point.
    #[must_use]
    pub fn distance_to(&self, p: Point2) -> f64 {
        match self {
            Self::Point(q) => (p - q).norm(),
            Self::Segment { start, end, .. } => point_to_segment_dist(*start, *end, p),
        }
    }
}

/// Source category of a site, recorded per corridor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Point,
    Segment,
}

/// A finite vertex of the generalized Voronoi diagram.
#[derive(Debug, Clone, Copy)]
pub struct DiagramVertex {
    pub position: Point2,
}

/// A directed half-edge of the generalized Voronoi diagram.
///
/// Endpoints are `None` when the upstream producer failed to clip an
/// unbounded ray; such diagrams are rejected at construction.
#[derive(Debug, Clone, Copy)]
pub struct DiagramEdge {
    /// Index of the start vertex, if finite.
    pub start: Option<usize>,
    /// Index of the end vertex, if finite.
    pub end: Option<usize>,
    /// Index of the opposite half-edge.
    pub twin: usize,
    /// Whether the edge is a straight segment (false for parabolic arcs).
    pub is_linear: bool,
    /// Index (into the site slice handed to the source) of the site whose
    /// cell lies on this half-edge's right side.
    pub site: usize,
}

/// Output of the Voronoi primitive: finite vertices plus twin-paired
/// directed edges with per-edge site metadata.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub vertices: Vec<DiagramVertex>,
    pub edges: Vec<DiagramEdge>,
}

impl Diagram {
    /// Validates structural invariants against a site slice of the given
    /// length.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnboundedInput` for edges missing a finite
    /// endpoint, `GraphError::MissingTwin` when twin pairing is not an
    /// involution, and `GraphError::SiteOutOfRange` for dangling site
    /// references.
    pub fn validate(&self, site_count: usize) -> Result<()> {
        for (i, edge) in self.edges.iter().enumerate() {
            let (Some(start), Some(end)) = (edge.start, edge.end) else {
                return Err(GraphError::UnboundedInput(i).into());
            };
            if start >= self.vertices.len() || end >= self.vertices.len() {
                return Err(GraphError::EntityNotFound(format!(
                    "diagram edge {i} endpoint vertex"
                ))
                .into());
            }
            if edge.site >= site_count {
                return Err(GraphError::SiteOutOfRange {
                    edge: i,
                    site: edge.site,
                }
                .into());
            }
            let twin = edge.twin;
            if twin == i || twin >= self.edges.len() || self.edges[twin].twin != i {
                return Err(GraphError::MissingTwin { edge: i, twin }.into());
            }
        }
        Ok(())
    }
}

/// A substitutable producer of generalized Voronoi diagrams.
///
/// The diagram computation itself is upstream of this crate: a native
/// segment-Voronoi library, a precomputed diagram, or the bundled
/// Delaunay dual for point-only site sets all plug in here. Producers
/// must exclude or pre-clip unbounded edges.
pub trait DiagramSource {
    /// Computes the diagram of the given sites.
    ///
    /// # Errors
    ///
    /// Returns an error if the site set cannot be triangulated or is
    /// unsupported by this source.
    fn compute(&self, sites: &[Site]) -> Result<Diagram>;
}

/// A source that replays one fixed, precomputed diagram.
///
/// Useful when the diagram is produced out-of-process; the site indices
/// inside the diagram must match the order sites were registered on the
/// graph.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    diagram: Diagram,
}

impl StaticSource {
    /// Wraps a precomputed diagram.
    #[must_use]
    pub fn new(diagram: Diagram) -> Self {
        Self { diagram }
    }
}

impl DiagramSource for StaticSource {
    fn compute(&self, _sites: &[Site]) -> Result<Diagram> {
        Ok(self.diagram.clone())
    }
}
