use std::fmt;

use super::{SiteId, VertexId};
use crate::math::{Point2, Rect, TOLERANCE};
use crate::voronoi::SiteKind;

/// Unique identifier for a corridor half-edge.
///
/// Ids are allocated from a per-graph monotonic counter and never reused
/// after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A directed corridor half-edge.
///
/// The twin half-edge runs the opposite direction; the pair forms one
/// undirected corridor segment. Twins reference each other by id, so the
/// arena holds no ownership cycle. The edge's own site bounds its right
/// side; the twin's site bounds its left.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Start vertex (non-owning reference).
    pub start: VertexId,
    /// End vertex (non-owning reference).
    pub end: VertexId,
    /// The opposite half-edge.
    pub twin: EdgeId,
    /// Whether the edge is straight (false for parabolic arcs between a
    /// point and a segment site).
    pub is_linear: bool,
    /// Site bounding the right side of the edge.
    pub site: SiteId,
    /// Category of [`Self::site`].
    pub site_kind: SiteKind,
    /// Six-point cell polygon: start, right contact at start, right
    /// contact at end, end, left contact at end, left contact at start.
    pub cell: [Point2; 6],
    /// Obstacle contact left of the start vertex.
    pub left_of_start: Point2,
    /// Obstacle contact right of the start vertex.
    pub right_of_start: Point2,
    /// Obstacle contact left of the end vertex.
    pub left_of_end: Point2,
    /// Obstacle contact right of the end vertex.
    pub right_of_end: Point2,
    /// Distance from the start vertex to its contacts.
    pub clearance_of_start: f64,
    /// Distance from the end vertex to its contacts.
    pub clearance_of_end: f64,
    /// Corridor half-width at the start vertex.
    pub width_of_start: f64,
    /// Corridor half-width at the end vertex.
    pub width_of_end: f64,
    /// Euclidean length of the edge chord.
    pub length: f64,
    /// Traversal cost; equals length.
    pub cost: f64,
    /// Per-radius trimmed contacts, indexed by registered radius index.
    pub properties: Vec<EdgeProperty>,
}

/// Contact points of an edge trimmed for one agent radius.
#[derive(Debug, Clone, Copy)]
pub struct EdgeProperty {
    pub left_of_start: Point2,
    pub right_of_start: Point2,
    pub left_of_end: Point2,
    pub right_of_end: Point2,
    pub clearance_of_start: f64,
    pub clearance_of_end: f64,
    pub width_of_start: f64,
    pub width_of_end: f64,
}

/// Construction parameters of an [`Edge`], before derived geometry.
pub(crate) struct EdgeSeed {
    pub start: VertexId,
    pub end: VertexId,
    pub start_position: Point2,
    pub end_position: Point2,
    pub is_linear: bool,
    pub site: SiteId,
    pub site_kind: SiteKind,
    pub left_of_start: Point2,
    pub right_of_start: Point2,
    pub left_of_end: Point2,
    pub right_of_end: Point2,
}

impl Edge {
    /// Builds an edge and its derived cell geometry. The twin id is wired
    /// by the graph once both directions exist.
    pub(crate) fn from_seed(seed: EdgeSeed, twin: EdgeId) -> Self {
        let EdgeSeed {
            start,
            end,
            start_position,
            end_position,
            is_linear,
            site,
            site_kind,
            left_of_start,
            right_of_start,
            left_of_end,
            right_of_end,
        } = seed;
        let length = (end_position - start_position).norm();
        Self {
            start,
            end,
            twin,
            is_linear,
            site,
            site_kind,
            cell: [
                start_position,
                right_of_start,
                right_of_end,
                end_position,
                left_of_end,
                left_of_start,
            ],
            left_of_start,
            right_of_start,
            left_of_end,
            right_of_end,
            clearance_of_start: (start_position - right_of_start).norm(),
            clearance_of_end: (end_position - right_of_end).norm(),
            width_of_start: (left_of_start - right_of_start).norm() / 2.0,
            width_of_end: (left_of_end - right_of_end).norm() / 2.0,
            length,
            cost: length,
            properties: Vec::new(),
        }
    }

    /// Position of the start vertex.
    #[must_use]
    pub fn start_position(&self) -> Point2 {
        self.cell[0]
    }

    /// Position of the end vertex.
    #[must_use]
    pub fn end_position(&self) -> Point2 {
        self.cell[3]
    }

    /// Conservative envelope of the cell polygon.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        // The cell is never empty, so this cannot fail.
        let mut min = self.cell[0];
        let mut max = self.cell[0];
        for p in &self.cell[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect { min, max }
    }

    /// Whether an agent of `radius` fits through both ends of the
    /// corridor.
    #[must_use]
    pub fn has_enough_clearance(&self, radius: f64) -> bool {
        radius <= self.width_of_start && radius <= self.width_of_end
    }

    /// Re-derives the construction seed of this edge, re-pointed at the
    /// given vertex ids. Used when grafting edges from a localized
    /// sub-build into a live graph.
    pub(crate) fn reseed(&self, start: VertexId, end: VertexId) -> EdgeSeed {
        EdgeSeed {
            start,
            end,
            start_position: self.start_position(),
            end_position: self.end_position(),
            is_linear: self.is_linear,
            site: self.site,
            site_kind: self.site_kind,
            left_of_start: self.left_of_start,
            right_of_start: self.right_of_start,
            left_of_end: self.left_of_end,
            right_of_end: self.right_of_end,
        }
    }

    /// Returns the trimmed contacts for a registered radius index.
    #[must_use]
    pub fn property(&self, radius_index: usize) -> Option<&EdgeProperty> {
        self.properties.get(radius_index)
    }

    /// Computes and caches the trimmed contacts for one agent radius.
    ///
    /// When the radius reaches the raw endpoint clearance the contacts
    /// collapse onto the vertex itself; otherwise each contact moves by
    /// `radius` toward the vertex.
    pub(crate) fn add_property(&mut self, radius: f64) {
        let start = self.start_position();
        let end = self.end_position();

        let (left_of_start, right_of_start) = if radius >= self.clearance_of_start {
            (start, start)
        } else {
            (
                shift_contact(self.left_of_start, start, radius),
                shift_contact(self.right_of_start, start, radius),
            )
        };
        let (left_of_end, right_of_end) = if radius >= self.clearance_of_end {
            (end, end)
        } else {
            (
                shift_contact(self.left_of_end, end, radius),
                shift_contact(self.right_of_end, end, radius),
            )
        };

        self.properties.push(EdgeProperty {
            left_of_start,
            right_of_start,
            left_of_end,
            right_of_end,
            clearance_of_start: (self.clearance_of_start - radius).max(0.0),
            clearance_of_end: (self.clearance_of_end - radius).max(0.0),
            width_of_start: (left_of_start - right_of_start).norm() / 2.0,
            width_of_end: (left_of_end - right_of_end).norm() / 2.0,
        });
    }
}

/// Moves a raw contact point `radius` along the contact-to-vertex
/// direction.
fn shift_contact(contact: Point2, vertex: Point2, radius: f64) -> Point2 {
    let dir = vertex - contact;
    let norm = dir.norm();
    if norm < TOLERANCE {
        return vertex;
    }
    contact + dir * (radius / norm)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn horizontal_edge() -> Edge {
        // Corridor from (0,0) to (10,0), obstacles 2 above and below.
        Edge::from_seed(
            EdgeSeed {
                start: VertexId(0),
                end: VertexId(1),
                start_position: Point2::new(0.0, 0.0),
                end_position: Point2::new(10.0, 0.0),
                is_linear: true,
                site: SiteId(0),
                site_kind: SiteKind::Segment,
                left_of_start: Point2::new(0.0, 2.0),
                right_of_start: Point2::new(0.0, -2.0),
                left_of_end: Point2::new(10.0, 2.0),
                right_of_end: Point2::new(10.0, -2.0),
            },
            EdgeId(1),
        )
    }

    #[test]
    fn derived_geometry() {
        let edge = horizontal_edge();
        assert_relative_eq!(edge.length, 10.0);
        assert_relative_eq!(edge.clearance_of_start, 2.0);
        assert_relative_eq!(edge.width_of_start, 2.0);
        assert_eq!(edge.cell[0], edge.start_position());
        assert_eq!(edge.cell[3], edge.end_position());
        let bounds = edge.bounds();
        assert_eq!(bounds.min, Point2::new(0.0, -2.0));
        assert_eq!(bounds.max, Point2::new(10.0, 2.0));
    }

    #[test]
    fn clearance_check_prunes_narrow_corridors() {
        let edge = horizontal_edge();
        assert!(edge.has_enough_clearance(1.5));
        assert!(edge.has_enough_clearance(2.0));
        assert!(!edge.has_enough_clearance(2.5));
    }

    #[test]
    fn trimmed_contacts_move_toward_the_vertex() {
        let mut edge = horizontal_edge();
        edge.add_property(0.5);
        let p = edge.property(0).unwrap();
        assert_relative_eq!(p.left_of_start.y, 1.5);
        assert_relative_eq!(p.right_of_start.y, -1.5);
        assert_relative_eq!(p.clearance_of_start, 1.5);
        assert_relative_eq!(p.width_of_start, 1.5);
    }

    #[test]
    fn oversized_radius_collapses_onto_the_vertex() {
        let mut edge = horizontal_edge();
        edge.add_property(3.0);
        let p = edge.property(0).unwrap();
        assert_eq!(p.left_of_start, Point2::new(0.0, 0.0));
        assert_eq!(p.right_of_start, Point2::new(0.0, 0.0));
        assert_relative_eq!(p.width_of_start, 0.0);
    }

    #[test]
    fn missing_property_index_is_none() {
        let edge = horizontal_edge();
        assert!(edge.property(0).is_none());
    }
}
