//! Incremental obstacle insertion.
//!
//! Inserting an obstacle invalidates only the corridors near it: the
//! obstacle envelope grown by the largest clearance seen next to it.
//! The updater rebuilds that neighbourhood in a detached patch graph,
//! deletes every live edge inside it, and grafts the patch back,
//! leaving the rest of the live topology untouched. When the
//! neighbourhood cannot be bounded the operation fails with
//! [`UpdateError::PatchIncomplete`] before any mutation, and callers
//! fall back to [`CorridorGraph::rebuild`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::error::{Result, UpdateError};
use crate::graph::{CorridorGraph, EdgeId, ObstacleId, ObstacleShape, SiteId, VertexId};
use crate::math::{Rect, TOLERANCE};
use crate::voronoi::{DiagramSource, Site};

/// Inserts one obstacle into a built corridor graph.
///
/// The candidate region is the obstacle envelope grown by the largest
/// clearance seen next to it; every edge inside it is replaced by the
/// patch. Deleting the whole region keeps stale cells out: an obstacle
/// can sit well inside a cell without reaching either endpoint's
/// clearance disk.
#[derive(Debug)]
pub struct InsertObstacle<'a> {
    pub shape: &'a ObstacleShape,
}

impl InsertObstacle<'_> {
    /// Applies the insertion, returning the id of the new obstacle.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::PatchIncomplete`] with the graph untouched
    /// when the affected region cannot be bounded. A failing diagram
    /// source also leaves the graph untouched: the patch is built before
    /// any live surgery and the half-registered obstacle is rolled back.
    pub fn execute(
        &self,
        graph: &mut CorridorGraph,
        source: &dyn DiagramSource,
    ) -> Result<ObstacleId> {
        let bounds = shape_bounds(self.shape)?;

        // Read-only phase: bound the affected region or bail out.
        let touching = graph.edges_in_envelope(&bounds);
        if touching.is_empty() {
            return Err(UpdateError::PatchIncomplete(format!(
                "no corridor cell meets the obstacle envelope ({:?}, {:?})",
                bounds.min, bounds.max
            ))
            .into());
        }
        let mut patch_radius = 0.0_f64;
        for id in &touching {
            let edge = graph.edge(*id)?;
            patch_radius = patch_radius
                .max(edge.clearance_of_start)
                .max(edge.clearance_of_end);
        }
        let extended = bounds.extended(patch_radius);
        let region = graph.edges_in_envelope(&extended);
        let mut affected: BTreeSet<EdgeId> = BTreeSet::new();
        let mut patch_sites: BTreeMap<SiteId, Site> = BTreeMap::new();
        for id in &region {
            let edge = graph.edge(*id)?;
            let clearance = edge.clearance_of_start.max(edge.clearance_of_end);
            if clearance > patch_radius + TOLERANCE {
                return Err(UpdateError::PatchIncomplete(format!(
                    "edge {id} has clearance {clearance} beyond the patch radius {patch_radius}"
                ))
                .into());
            }
            gather_site(graph, edge.site, &mut patch_sites)?;
            affected.insert(*id);
            affected.insert(edge.twin);
        }
        trace!(
            touching = touching.len(),
            affected = affected.len(),
            patch_radius,
            "bounded the insertion patch"
        );

        // Build the patch before touching the live topology, so a
        // failing source cannot leave a half-applied update behind.
        let obstacle_id = graph.add_obstacle(self.shape)?;
        let new_sites = graph.obstacle(obstacle_id)?.sites.clone();
        for id in new_sites {
            patch_sites.insert(id, graph.site(id)?.clone());
        }
        let mut patch = CorridorGraph::new();
        for (id, site) in &patch_sites {
            patch.insert_site_with_id(*id, site.clone());
        }
        if let Err(source_error) = patch.construct(source) {
            graph.remove_obstacle(obstacle_id);
            return Err(source_error);
        }

        for id in &affected {
            graph.remove_edge(*id)?;
        }
        let grafted = graft_patch(graph, &patch, &extended)?;
        debug!(
            obstacle = %obstacle_id,
            removed = affected.len(),
            grafted,
            "inserted obstacle incrementally"
        );
        Ok(obstacle_id)
    }
}

/// Adds one site to the patch registry. Sites parented to a polygonal
/// obstacle pull in every wall of that obstacle, so the patch sees the
/// whole polygon.
fn gather_site(
    graph: &CorridorGraph,
    id: SiteId,
    patch_sites: &mut BTreeMap<SiteId, Site>,
) -> Result<()> {
    let site = graph.site(id)?;
    if let Site::Segment {
        parent: Some(obstacle),
        ..
    } = site
    {
        for wall in &graph.obstacle(*obstacle)?.sites {
            patch_sites.insert(*wall, graph.site(*wall)?.clone());
        }
    } else {
        patch_sites.insert(id, site.clone());
    }
    Ok(())
}

/// Grafts patch edges missing from the live graph, splicing onto
/// surviving vertices where positions coincide.
fn graft_patch(graph: &mut CorridorGraph, patch: &CorridorGraph, extended: &Rect) -> Result<usize> {
    // Survivor matches and freshly created vertices are cached apart,
    // so a created vertex is never mistaken for a splice point.
    let mut matched: BTreeMap<VertexId, Option<VertexId>> = BTreeMap::new();
    let mut created: BTreeMap<VertexId, VertexId> = BTreeMap::new();
    let mut done: BTreeSet<EdgeId> = BTreeSet::new();
    let mut grafted = 0;
    for id in patch.edges_in_envelope(extended) {
        if !done.insert(id) {
            continue;
        }
        let edge = patch.edge(id)?;
        done.insert(edge.twin);
        let twin = patch.edge(edge.twin)?;

        let start = match_vertex(graph, patch, edge.start, &mut matched)?;
        let end = match_vertex(graph, patch, edge.end, &mut matched)?;
        if let (Some(start), Some(end)) = (start, end) {
            let survived = graph
                .vertex(start)?
                .edges
                .iter()
                .any(|e| graph.edge(*e).is_ok_and(|live| live.end == end));
            if survived {
                continue;
            }
        }

        let start = spliced(graph, patch, edge.start, start, &mut created)?;
        let end = spliced(graph, patch, edge.end, end, &mut created)?;
        graph.attach_edge_pair(edge.reseed(start, end), twin.reseed(end, start));
        grafted += 1;
    }
    Ok(grafted)
}

/// Resolves a patch vertex to a live one, creating it on first use and
/// flagging reused survivors as splice points.
fn spliced(
    graph: &mut CorridorGraph,
    patch: &CorridorGraph,
    patch_vertex: VertexId,
    matched: Option<VertexId>,
    created: &mut BTreeMap<VertexId, VertexId>,
) -> Result<VertexId> {
    if let Some(live) = matched {
        graph.vertex_mut(live)?.is_linked = true;
        return Ok(live);
    }
    if let Some(live) = created.get(&patch_vertex) {
        return Ok(*live);
    }
    let live = graph.insert_vertex(patch.vertex(patch_vertex)?.position);
    created.insert(patch_vertex, live);
    Ok(live)
}

fn shape_bounds(shape: &ObstacleShape) -> Result<Rect> {
    Ok(match shape {
        ObstacleShape::Point(p) => Rect { min: *p, max: *p },
        ObstacleShape::Segment(a, b) => Rect::from_points(&[*a, *b])?,
        ObstacleShape::Polygon(points) => Rect::from_points(points)?,
    })
}

/// Finds the surviving live vertex at a patch vertex position, if any.
fn match_vertex(
    graph: &CorridorGraph,
    patch: &CorridorGraph,
    patch_vertex: VertexId,
    live_of_patch: &mut BTreeMap<VertexId, Option<VertexId>>,
) -> Result<Option<VertexId>> {
    if let Some(cached) = live_of_patch.get(&patch_vertex) {
        return Ok(*cached);
    }
    let position = patch.vertex(patch_vertex)?.position;
    let matched = match graph.nearest_vertex(position) {
        Some(live) if (graph.vertex(live)?.position - position).norm() < TOLERANCE => Some(live),
        _ => None,
    };
    live_of_patch.insert(patch_vertex, matched);
    Ok(matched)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{CorridorError, GeometryError};
    use crate::math::polygon_2d::polygon_contains_point;
    use crate::math::Point2;
    use crate::voronoi::{DelaunaySource, Diagram, DiagramEdge, DiagramVertex, StaticSource};
    use approx::assert_relative_eq;

    fn cross_graph() -> CorridorGraph {
        let mut graph = CorridorGraph::new();
        graph.add_point_site(Point2::new(-5.0, -5.0));
        graph.add_point_site(Point2::new(5.0, -5.0));
        graph.add_point_site(Point2::new(5.0, 5.0));
        graph.add_point_site(Point2::new(-5.0, 5.0));
        graph.add_point_site(Point2::new(0.0, 0.0));
        graph.construct(&DelaunaySource).unwrap();
        graph
    }

    fn diagram(positions: &[(f64, f64)], corridors: &[(usize, usize, usize, usize)]) -> Diagram {
        let mut diagram = Diagram::default();
        for (x, y) in positions {
            diagram.vertices.push(DiagramVertex {
                position: Point2::new(*x, *y),
            });
        }
        for (start, end, forward_site, backward_site) in corridors {
            let index = diagram.edges.len();
            diagram.edges.push(DiagramEdge {
                start: Some(*start),
                end: Some(*end),
                twin: index + 1,
                is_linear: true,
                site: *forward_site,
            });
            diagram.edges.push(DiagramEdge {
                start: Some(*end),
                end: Some(*start),
                twin: index,
                is_linear: true,
                site: *backward_site,
            });
        }
        diagram
    }

    /// A straight corridor of three cells between two walls, clearance 2
    /// everywhere. Site 0 is the top wall, site 1 the bottom wall.
    fn corridor_graph() -> CorridorGraph {
        let mut graph = CorridorGraph::new();
        graph.add_segment_site(Point2::new(0.0, 2.0), Point2::new(30.0, 2.0));
        graph.add_segment_site(Point2::new(0.0, -2.0), Point2::new(30.0, -2.0));
        let skeleton = diagram(
            &[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)],
            &[(0, 1, 1, 0), (1, 2, 1, 0), (2, 3, 1, 0)],
        );
        graph.construct(&StaticSource::new(skeleton)).unwrap();
        graph
    }

    /// Replacement for the middle cell once a point obstacle sits at
    /// (15, 0): the corridor splits around it. Site indices follow the
    /// gathered registry order: top wall, bottom wall, obstacle.
    fn split_patch() -> Diagram {
        diagram(
            &[(10.0, 0.0), (20.0, 0.0), (15.0, 1.0), (15.0, -1.0)],
            &[(0, 2, 2, 0), (2, 1, 2, 0), (0, 3, 1, 2), (3, 1, 1, 2)],
        )
    }

    fn sorted_positions(graph: &CorridorGraph) -> Vec<(f64, f64)> {
        let mut positions: Vec<(f64, f64)> = graph
            .vertices()
            .map(|(_, v)| (v.position.x, v.position.y))
            .collect();
        positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
        positions
    }

    #[test]
    fn incremental_insert_matches_a_full_rebuild() {
        let mut incremental = cross_graph();
        let inserted = InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(2.0, 0.0)),
        }
        .execute(&mut incremental, &DelaunaySource)
        .unwrap();
        assert!(incremental.obstacle(inserted).is_ok());

        let mut rebuilt = CorridorGraph::new();
        graph_sites(&mut rebuilt);
        rebuilt.add_point_site(Point2::new(2.0, 0.0));
        rebuilt.construct(&DelaunaySource).unwrap();

        assert_eq!(incremental.edge_count(), rebuilt.edge_count());
        assert_eq!(incremental.vertex_count(), rebuilt.vertex_count());
        let a = sorted_positions(&incremental);
        let b = sorted_positions(&rebuilt);
        for (p, q) in a.iter().zip(&b) {
            assert_relative_eq!(p.0, q.0, epsilon = 1e-9);
            assert_relative_eq!(p.1, q.1, epsilon = 1e-9);
        }
    }

    fn graph_sites(graph: &mut CorridorGraph) {
        graph.add_point_site(Point2::new(-5.0, -5.0));
        graph.add_point_site(Point2::new(5.0, -5.0));
        graph.add_point_site(Point2::new(5.0, 5.0));
        graph.add_point_site(Point2::new(-5.0, 5.0));
        graph.add_point_site(Point2::new(0.0, 0.0));
    }

    #[test]
    fn interior_obstacle_clears_the_stale_corridor() {
        let mut graph = corridor_graph();
        let obstacle = Point2::new(15.0, 0.0);
        // The obstacle sits mid-cell, outside both endpoint clearance
        // disks; the whole cell must still be replaced.
        let stale = graph.nearest_edge(obstacle).unwrap();
        let stale_twin = graph.edge(stale).unwrap().twin;
        assert!(polygon_contains_point(&graph.edge(stale).unwrap().cell, obstacle));
        InsertObstacle {
            shape: &ObstacleShape::Point(obstacle),
        }
        .execute(&mut graph, &StaticSource::new(split_patch()))
        .unwrap();
        assert!(graph.edge(stale).is_err());
        assert!(graph.edge(stale_twin).is_err());
        assert_eq!(graph.vertex_count(), 6);
        assert_eq!(graph.edge_count(), 12);
    }

    #[test]
    fn graft_splices_onto_surviving_junctions() {
        let mut graph = corridor_graph();
        InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(15.0, 0.0)),
        }
        .execute(&mut graph, &StaticSource::new(split_patch()))
        .unwrap();

        // The junctions at (10, 0) and (20, 0) survive and anchor the
        // patch; everything else keeps its flag.
        let linked: Vec<f64> = graph
            .vertices()
            .filter(|(_, vertex)| vertex.is_linked)
            .map(|(_, vertex)| vertex.position.x)
            .collect();
        assert_eq!(linked, vec![10.0, 20.0]);
    }

    #[test]
    fn untouched_corridors_are_byte_identical() {
        let mut graph = corridor_graph();
        let before: Vec<(EdgeId, VertexId, VertexId, [Point2; 6])> = graph
            .edges()
            .map(|(id, e)| (id, e.start, e.end, e.cell))
            .collect();
        InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(15.0, 0.0)),
        }
        .execute(&mut graph, &StaticSource::new(split_patch()))
        .unwrap();

        // Every pre-update edge is either removed whole or untouched.
        let mut survivors = 0;
        for (id, start, end, cell) in before {
            if let Ok(edge) = graph.edge(id) {
                assert_eq!(edge.start, start);
                assert_eq!(edge.end, end);
                assert_eq!(edge.cell, cell);
                survivors += 1;
            }
        }
        assert_eq!(survivors, 4, "the outer cells must survive");
    }

    struct FaultySource;

    impl DiagramSource for FaultySource {
        fn compute(&self, _sites: &[Site]) -> Result<Diagram> {
            Err(GeometryError::Degenerate("backend unavailable".into()).into())
        }
    }

    #[test]
    fn patch_failure_rolls_back_the_obstacle() {
        let mut graph = corridor_graph();
        let edges_before = graph.edge_count();
        let err = InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(15.0, 0.0)),
        }
        .execute(&mut graph, &FaultySource)
        .unwrap_err();
        assert!(matches!(err, CorridorError::Geometry(_)));
        assert_eq!(graph.edge_count(), edges_before);
        assert!(graph
            .obstacles_in_envelope(&Rect {
                min: Point2::new(10.0, -2.0),
                max: Point2::new(20.0, 2.0),
            })
            .is_empty());

        // A retry with a working source goes through unhindered.
        InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(15.0, 0.0)),
        }
        .execute(&mut graph, &StaticSource::new(split_patch()))
        .unwrap();
        assert_eq!(graph.edge_count(), 12);
    }

    #[test]
    fn far_away_obstacle_fails_before_mutating() {
        let mut graph = cross_graph();
        let edges_before = graph.edge_count();
        let err = InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(100.0, 100.0)),
        }
        .execute(&mut graph, &DelaunaySource)
        .unwrap_err();
        assert!(matches!(
            err,
            CorridorError::Update(UpdateError::PatchIncomplete(_))
        ));
        assert_eq!(graph.edge_count(), edges_before);
        assert_eq!(graph.obstacles_in_envelope(&Rect {
            min: Point2::new(90.0, 90.0),
            max: Point2::new(110.0, 110.0),
        })
        .len(), 0);
    }

    #[test]
    fn twin_pairing_holds_after_an_insert() {
        let mut graph = cross_graph();
        InsertObstacle {
            shape: &ObstacleShape::Point(Point2::new(2.0, 0.0)),
        }
        .execute(&mut graph, &DelaunaySource)
        .unwrap();
        for (id, edge) in graph.edges() {
            let twin = graph.edge(edge.twin).unwrap();
            assert_eq!(twin.twin, id);
            assert_eq!(twin.start, edge.end);
        }
        for (id, vertex) in graph.vertices() {
            assert!(!vertex.edges.is_empty(), "isolated vertex {id}");
        }
    }
}
