pub mod edge;
pub(crate) mod index;
pub mod vertex;

pub use edge::{Edge, EdgeId, EdgeProperty};
pub use vertex::{Vertex, VertexId};

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{GeometryError, GraphError, Result};
use crate::math::distance_2d::closest_point_on_segment;
use crate::math::parabola_2d::densify_parabola;
use crate::math::polygon_2d::polygon_contains_point;
use crate::math::{Point2, Rect, TOLERANCE};
use crate::voronoi::{Diagram, DiagramSource, Site, SiteKind};
use edge::EdgeSeed;
use index::{NearestPointIndex, RangeIndex};

/// Unique identifier for an input site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteId(pub(crate) u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Unique identifier for a registered obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstacleId(pub(crate) u32);

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

/// A registered obstacle: the sites it generated plus its envelope.
#[derive(Debug, Clone)]
pub struct Obstacle {
    /// Sites generated by this obstacle.
    pub sites: Vec<SiteId>,
    /// Axis-aligned envelope of the obstacle geometry.
    pub bounds: Rect,
}

/// Input geometry for [`CorridorGraph::add_obstacle`].
#[derive(Debug, Clone)]
pub enum ObstacleShape {
    /// A point obstacle.
    Point(Point2),
    /// A free-standing oriented segment.
    Segment(Point2, Point2),
    /// A closed polygon; each boundary segment becomes a site parented
    /// to the obstacle.
    Polygon(Vec<Point2>),
}

/// The corridor map: a planar graph of maximal-clearance channels
/// between static obstacles.
///
/// Vertices and edges live in id-keyed arenas with per-graph monotonic
/// counters; ids are never reused after deletion. Queries take `&self`,
/// all mutation takes `&mut self`, which yields the exclusive-writer /
/// concurrent-readers discipline: no reader can observe a half-applied
/// update.
#[derive(Debug, Default)]
pub struct CorridorGraph {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    sites: BTreeMap<SiteId, Site>,
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    vertex_index: NearestPointIndex,
    edge_index: RangeIndex<EdgeId>,
    obstacle_index: RangeIndex<ObstacleId>,
    radii: Vec<f64>,
    next_vertex: u32,
    next_edge: u32,
    next_site: u32,
    next_obstacle: u32,
}

impl CorridorGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Site and obstacle registration ---

    /// Registers a free-standing point site.
    pub fn add_point_site(&mut self, p: Point2) -> SiteId {
        self.insert_site(Site::Point(p))
    }

    /// Registers a free-standing segment site.
    pub fn add_segment_site(&mut self, start: Point2, end: Point2) -> SiteId {
        self.insert_site(Site::Segment {
            start,
            end,
            parent: None,
        })
    }

    /// Registers the four walls of a rectangular border as segment sites.
    pub fn add_border(&mut self, rect: &Rect) -> [SiteId; 4] {
        let a = rect.min;
        let b = Point2::new(rect.min.x, rect.max.y);
        let c = rect.max;
        let d = Point2::new(rect.max.x, rect.min.y);
        [
            self.add_segment_site(a, b),
            self.add_segment_site(b, c),
            self.add_segment_site(c, d),
            self.add_segment_site(d, a),
        ]
    }

    /// Registers an obstacle, generating its sites.
    ///
    /// # Errors
    ///
    /// Returns a geometry error for polygons with fewer than three
    /// points or degenerate segment bounds.
    pub fn add_obstacle(&mut self, shape: &ObstacleShape) -> Result<ObstacleId> {
        let id = ObstacleId(self.next_obstacle);
        let (sites, bounds) = match shape {
            ObstacleShape::Point(p) => (vec![self.insert_site(Site::Point(*p))], Rect {
                min: *p,
                max: *p,
            }),
            ObstacleShape::Segment(a, b) => {
                let bounds = Rect::from_points(&[*a, *b])?;
                (
                    vec![self.insert_site(Site::Segment {
                        start: *a,
                        end: *b,
                        parent: Some(id),
                    })],
                    bounds,
                )
            }
            ObstacleShape::Polygon(points) => {
                if points.len() < 3 {
                    return Err(GeometryError::Degenerate(format!(
                        "obstacle polygon needs at least 3 points, got {}",
                        points.len()
                    ))
                    .into());
                }
                let bounds = Rect::from_points(points)?;
                let mut sites = Vec::with_capacity(points.len());
                for i in 0..points.len() {
                    let j = (i + 1) % points.len();
                    sites.push(self.insert_site(Site::Segment {
                        start: points[i],
                        end: points[j],
                        parent: Some(id),
                    }));
                }
                (sites, bounds)
            }
        };
        self.next_obstacle += 1;
        self.obstacle_index.insert(id, &bounds);
        self.obstacles.insert(id, Obstacle { sites, bounds });
        Ok(id)
    }

    /// Unregisters an obstacle and its sites again. Topology is not
    /// touched; the incremental updater uses this to roll back a failed
    /// insertion before any surgery happened. Ids are not reissued.
    pub(crate) fn remove_obstacle(&mut self, id: ObstacleId) {
        if let Some(obstacle) = self.obstacles.remove(&id) {
            self.obstacle_index.remove(id, &obstacle.bounds);
            for site in &obstacle.sites {
                self.sites.remove(site);
            }
        }
    }

    fn insert_site(&mut self, site: Site) -> SiteId {
        let id = SiteId(self.next_site);
        self.next_site += 1;
        self.sites.insert(id, site);
        id
    }

    /// Inserts a site under a caller-chosen id, used when mirroring a
    /// subset of another graph's registry into a localized sub-build.
    pub(crate) fn insert_site_with_id(&mut self, id: SiteId, site: Site) {
        self.next_site = self.next_site.max(id.0 + 1);
        self.sites.insert(id, site);
    }

    // --- Construction ---

    /// Builds the corridor graph from the registered sites.
    ///
    /// Any previously built topology is replaced; sites, obstacles and
    /// registered radii are kept.
    ///
    /// # Errors
    ///
    /// Fails fast on diagrams with unbounded edges, broken twin pairing
    /// or dangling site references. Nothing is silently clipped.
    pub fn construct(&mut self, source: &dyn DiagramSource) -> Result<()> {
        let site_ids: Vec<SiteId> = self.sites.keys().copied().collect();
        let site_list: Vec<Site> = self.sites.values().cloned().collect();
        let diagram = source.compute(&site_list)?;
        diagram.validate(site_list.len())?;

        self.vertices.clear();
        self.edges.clear();
        self.vertex_index.clear();
        self.edge_index.clear();
        self.populate(&diagram, &site_ids)?;
        debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            "constructed corridor graph"
        );
        Ok(())
    }

    /// Full reconstruction from the current site registry.
    ///
    /// The escape hatch for incremental updates that report
    /// [`crate::error::UpdateError::PatchIncomplete`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::construct`].
    pub fn rebuild(&mut self, source: &dyn DiagramSource) -> Result<()> {
        self.construct(source)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn populate(&mut self, diagram: &Diagram, site_ids: &[SiteId]) -> Result<()> {
        let mut vertex_ids = Vec::with_capacity(diagram.vertices.len());
        for v in &diagram.vertices {
            vertex_ids.push(self.insert_vertex(v.position));
        }

        let first_edge = self.next_edge;
        self.next_edge += diagram.edges.len() as u32;
        for (j, input) in diagram.edges.iter().enumerate() {
            let id = EdgeId(first_edge + j as u32);
            let twin = EdgeId(first_edge + input.twin as u32);
            let start_index = input.start.ok_or(GraphError::UnboundedInput(j))?;
            let end_index = input.end.ok_or(GraphError::UnboundedInput(j))?;
            let start_position = diagram.vertices[start_index].position;
            let end_position = diagram.vertices[end_index].position;

            let site = site_ids[input.site];
            let twin_site = site_ids[diagram.edges[input.twin].site];
            let (site_kind, right_of_start, right_of_end) =
                self.project_contacts(site, start_position, end_position)?;
            let (_, left_of_start, left_of_end) =
                self.project_contacts(twin_site, start_position, end_position)?;

            let edge = Edge::from_seed(
                EdgeSeed {
                    start: vertex_ids[start_index],
                    end: vertex_ids[end_index],
                    start_position,
                    end_position,
                    is_linear: input.is_linear,
                    site,
                    site_kind,
                    left_of_start,
                    right_of_start,
                    left_of_end,
                    right_of_end,
                },
                twin,
            );
            self.attach_edge(id, edge);
        }
        Ok(())
    }

    /// Projects an edge's endpoints onto one bounding site.
    fn project_contacts(
        &self,
        site: SiteId,
        start: Point2,
        end: Point2,
    ) -> Result<(SiteKind, Point2, Point2)> {
        let site = self
            .sites
            .get(&site)
            .ok_or_else(|| GraphError::EntityNotFound(format!("site {site}")))?;
        Ok(match site {
            Site::Point(p) => (SiteKind::Point, *p, *p),
            Site::Segment { start: a, end: b, .. } => (
                SiteKind::Segment,
                closest_point_on_segment(*a, *b, start).0,
                closest_point_on_segment(*a, *b, end).0,
            ),
        })
    }

    pub(crate) fn insert_vertex(&mut self, position: Point2) -> VertexId {
        let id = VertexId(self.next_vertex);
        self.next_vertex += 1;
        self.vertices.insert(id, Vertex::new(position));
        self.vertex_index.insert(id, position);
        id
    }

    /// Inserts one fully built edge under a preallocated id: registers
    /// adjacency, spatial index and per-radius properties.
    fn attach_edge(&mut self, id: EdgeId, mut edge: Edge) {
        for radius in &self.radii {
            edge.add_property(*radius);
        }
        if edge.clearance_of_start < TOLERANCE {
            if let Some(v) = self.vertices.get_mut(&edge.start) {
                v.is_boundary = true;
            }
        }
        self.edge_index.insert(id, &edge.bounds());
        if let Some(v) = self.vertices.get_mut(&edge.start) {
            v.edges.push(id);
            v.edges.sort_unstable();
        }
        self.edges.insert(id, edge);
    }

    /// Inserts a twin pair of spliced edges built from seeds, allocating
    /// fresh live ids.
    pub(crate) fn attach_edge_pair(
        &mut self,
        forward: EdgeSeed,
        backward: EdgeSeed,
    ) -> (EdgeId, EdgeId) {
        let forward_id = EdgeId(self.next_edge);
        let backward_id = EdgeId(self.next_edge + 1);
        self.next_edge += 2;
        self.attach_edge(forward_id, Edge::from_seed(forward, backward_id));
        self.attach_edge(backward_id, Edge::from_seed(backward, forward_id));
        (forward_id, backward_id)
    }

    // --- Queries ---

    /// Returns the corridor edge whose cell contains `p`.
    ///
    /// Falls back to an edge of the globally nearest vertex when `p`
    /// lies outside all candidate cells (conservative-box misses and
    /// boundary gaps). Returns `None` only for an empty graph; the
    /// fallback failing on a populated graph is a contract violation.
    #[must_use]
    pub fn nearest_edge(&self, p: Point2) -> Option<EdgeId> {
        for id in self.edge_index.search_at(p) {
            if let Some(edge) = self.edges.get(&id) {
                if polygon_contains_point(&edge.cell, p) {
                    return Some(id);
                }
            }
        }
        let vertex_id = self.vertex_index.nearest(p)?;
        let vertex = self.vertices.get(&vertex_id)?;
        debug_assert!(
            !vertex.edges.is_empty(),
            "isolated vertex {vertex_id} in live graph"
        );
        vertex.edges.first().copied()
    }

    /// Returns the vertex nearest to `p`, if any.
    #[must_use]
    pub fn nearest_vertex(&self, p: Point2) -> Option<VertexId> {
        self.vertex_index.nearest(p)
    }

    /// Returns up to `k` vertices nearest to `p`, closest first.
    #[must_use]
    pub fn nearest_vertices(&self, p: Point2, k: usize) -> Vec<VertexId> {
        self.vertex_index.nearest_k(p, k)
    }

    /// Returns ids of edges whose cell box intersects the envelope.
    #[must_use]
    pub fn edges_in_envelope(&self, bounds: &Rect) -> Vec<EdgeId> {
        self.edge_index.search(bounds)
    }

    /// Returns ids of obstacles whose box intersects the envelope.
    #[must_use]
    pub fn obstacles_in_envelope(&self, bounds: &Rect) -> Vec<ObstacleId> {
        self.obstacle_index.search(bounds)
    }

    // --- Agent radii ---

    /// Registers an agent radius, computing trimmed contacts for every
    /// edge. Returns the radius index used by planners and groups.
    pub fn register_radius(&mut self, radius: f64) -> usize {
        let index = self.radii.len();
        self.radii.push(radius);
        for edge in self.edges.values_mut() {
            edge.add_property(radius);
        }
        index
    }

    /// The registered agent radii, in registration order.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    // --- Mutation ---

    /// Removes a half-edge: detaches it from its start vertex, drops the
    /// vertex if it became isolated, and forgets the cell box.
    ///
    /// The twin is not touched; callers removing a corridor segment
    /// remove both directions.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        let edge = self
            .edges
            .remove(&id)
            .ok_or_else(|| GraphError::EntityNotFound(format!("edge {id}")))?;
        self.edge_index.remove(id, &edge.bounds());
        if let Some(vertex) = self.vertices.get_mut(&edge.start) {
            vertex.edges.retain(|e| *e != id);
            if vertex.edges.is_empty() {
                self.remove_vertex(edge.start);
            }
        }
        Ok(())
    }

    pub(crate) fn remove_vertex(&mut self, id: VertexId) {
        if let Some(vertex) = self.vertices.remove(&id) {
            self.vertex_index.remove(id, vertex.position);
        }
    }

    // --- Accessors ---

    /// Returns a vertex, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(&id)
            .ok_or_else(|| GraphError::EntityNotFound(format!("vertex {id}")).into())
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.vertices
            .get_mut(&id)
            .ok_or_else(|| GraphError::EntityNotFound(format!("vertex {id}")).into())
    }

    /// Returns an edge, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges
            .get(&id)
            .ok_or_else(|| GraphError::EntityNotFound(format!("edge {id}")).into())
    }

    /// Returns a site, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn site(&self, id: SiteId) -> Result<&Site> {
        self.sites
            .get(&id)
            .ok_or_else(|| GraphError::EntityNotFound(format!("site {id}")).into())
    }

    /// Returns an obstacle, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn obstacle(&self, id: ObstacleId) -> Result<&Obstacle> {
        self.obstacles
            .get(&id)
            .ok_or_else(|| GraphError::EntityNotFound(format!("obstacle {id}")).into())
    }

    /// Iterates over all vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter().map(|(id, v)| (*id, v))
    }

    /// Iterates over all half-edges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().map(|(id, e)| (*id, e))
    }

    /// Number of live vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of live half-edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // --- Debug geometry ---

    /// Generates a polyline for rendering an edge.
    ///
    /// Straight edges and segment/segment corridors yield the two-point
    /// chord; parabolic edges between a point and a segment site are
    /// densified until chord deviation drops below `max_distance`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidSampleStep` for a non-positive
    /// step, or an entity error for dangling ids.
    pub fn sample_curved_edge(&self, id: EdgeId, max_distance: f64) -> Result<Vec<Point2>> {
        if max_distance <= 0.0 {
            return Err(GeometryError::InvalidSampleStep(max_distance).into());
        }
        let edge = self.edge(id)?;
        let twin = self.edge(edge.twin)?;
        let chord = vec![edge.start_position(), edge.end_position()];
        if edge.is_linear {
            return Ok(chord);
        }
        let own = self.site(edge.site)?;
        let other = self.site(twin.site)?;
        match (own, other) {
            (Site::Point(focus), Site::Segment { start, end, .. })
            | (Site::Segment { start, end, .. }, Site::Point(focus)) => densify_parabola(
                *focus,
                *start,
                *end,
                edge.start_position(),
                edge.end_position(),
                max_distance,
            ),
            _ => Ok(chord),
        }
    }
}
