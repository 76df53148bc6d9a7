//! Two-level path planning: a coarse A* over the corridor graph picks a
//! channel, then the funnel algorithm pulls the shortest path through it.

pub(crate) mod astar;
pub(crate) mod funnel;
pub(crate) mod portal;

use tracing::debug;

use astar::CorridorSearch;
use funnel::string_pull;
use portal::build_portals;

use crate::error::{GraphError, Result};
use crate::graph::{CorridorGraph, EdgeId, VertexId};
use crate::math::Point2;

/// A single-agent path request.
///
/// `radius_index` selects a radius registered on the graph; `None` plans
/// for a point agent against the raw contacts. "No path" is a valid
/// outcome, not an error: the returned [`Path`] is empty.
#[derive(Debug, Clone, Copy)]
pub struct PathQuery {
    pub start: Point2,
    pub goal: Point2,
    pub radius_index: Option<usize>,
    /// Upper bound on A* vertex expansions, unbounded when `None`.
    pub expansion_limit: Option<usize>,
}

/// A planned path: smoothed waypoints plus the corridor it threads.
#[derive(Debug, Clone, Default)]
pub struct Path {
    /// Waypoints from start to goal; empty when no path exists.
    pub waypoints: Vec<Point2>,
    /// Traversed half-edges in travel order. Empty when start and goal
    /// share a cell.
    pub corridor: Vec<EdgeId>,
    /// Vertex expansions spent by the search.
    pub expanded: usize,
}

impl Path {
    /// Whether the request was unreachable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Total length of the waypoint polyline.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .sum()
    }

    fn unreachable() -> Self {
        Self::default()
    }
}

impl PathQuery {
    /// Plans the path on the given graph.
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered radius index or an exhausted
    /// expansion budget. Unreachable goals are reported as an empty path.
    pub fn execute(&self, graph: &CorridorGraph) -> Result<Path> {
        plan(
            graph,
            self.start,
            &[],
            self.goal,
            self.radius_index,
            self.expansion_limit,
        )
    }
}

/// Shared planning pipeline behind [`PathQuery`] and the group layer.
///
/// `anchors` overrides the A* seed position per start-cell vertex; group
/// requests anchor each entry vertex with the member closest to it so
/// the shared corridor leaves the cell where the group actually stands.
pub(crate) fn plan(
    graph: &CorridorGraph,
    start: Point2,
    anchors: &[(VertexId, Point2)],
    goal: Point2,
    radius_index: Option<usize>,
    expansion_limit: Option<usize>,
) -> Result<Path> {
    let radius = match radius_index {
        Some(index) => *graph
            .radii()
            .get(index)
            .ok_or(GraphError::UnregisteredRadius(index))?,
        None => 0.0,
    };
    let (Some(start_edge), Some(goal_edge)) = (graph.nearest_edge(start), graph.nearest_edge(goal))
    else {
        return Ok(Path::unreachable());
    };
    let start_ref = graph.edge(start_edge)?;
    let goal_ref = graph.edge(goal_edge)?;
    if !start_ref.has_enough_clearance(radius) || !goal_ref.has_enough_clearance(radius) {
        debug!(%start_edge, %goal_edge, radius, "endpoint cell too narrow");
        return Ok(Path::unreachable());
    }

    // Start and goal share a cell: both half-edges map to the same
    // corridor cross-section.
    if start_edge == goal_edge || start_ref.twin == goal_edge {
        return Ok(Path {
            waypoints: vec![start, goal],
            corridor: Vec::new(),
            expanded: 0,
        });
    }

    let search = CorridorSearch {
        graph,
        radius,
        expansion_limit,
        anchors,
    };
    let Some(outcome) = search.run(start_edge, start, goal_edge, goal)? else {
        debug!(%start_edge, %goal_edge, radius, "goal cell unreachable");
        return Ok(Path::unreachable());
    };

    let portals = build_portals(graph, &outcome.corridor, start, goal, radius_index)?;
    let waypoints = string_pull(&portals);
    debug!(
        %start_edge,
        %goal_edge,
        corridor = outcome.corridor.len(),
        expanded = outcome.expanded,
        waypoints = waypoints.len(),
        "planned path"
    );
    Ok(Path {
        waypoints,
        corridor: outcome.corridor,
        expanded: outcome.expanded,
    })
}
