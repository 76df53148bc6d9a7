//! Group planning: agents standing in the same corridor cell share one
//! search instead of planning individually.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{GroupError, Result};
use crate::graph::{CorridorGraph, EdgeId};
use crate::math::Point2;
use crate::planning;

/// One member of a group request.
#[derive(Debug, Clone, Copy)]
pub struct Agent {
    pub position: Point2,
    /// Radius registered on the graph; all agents of a group share it.
    pub radius_index: usize,
}

/// A group path request toward a common goal.
#[derive(Debug, Clone, Copy)]
pub struct GroupQuery {
    pub goal: Point2,
    pub expansion_limit: Option<usize>,
}

/// Route handed to one agent: the subgroup's shared waypoints, entered
/// from the agent's own position, plus its lateral offsets inside the
/// starting corridor.
#[derive(Debug, Clone)]
pub struct AgentRoute {
    /// Index into the requesting agent slice.
    pub agent: usize,
    pub waypoints: Vec<Point2>,
    /// Distance to the obstacle left of the travel direction.
    pub left_distance: f64,
    /// Distance to the obstacle right of the travel direction.
    pub right_distance: f64,
}

/// Outcome of a group request.
#[derive(Debug, Clone, Default)]
pub struct GroupPlan {
    /// Per-agent routes, ordered by agent index.
    pub routes: Vec<AgentRoute>,
    /// Number of planner invocations spent; one per subgroup.
    pub searches: usize,
}

impl GroupQuery {
    /// Plans routes for all agents, coalescing cell-mates into
    /// subgroups.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::MixedRadii`] when agents disagree on their
    /// radius index; planner errors propagate unchanged.
    pub fn execute(&self, graph: &CorridorGraph, agents: &[Agent]) -> Result<GroupPlan> {
        let Some(first) = agents.first() else {
            return Ok(GroupPlan::default());
        };
        let expected = first.radius_index;
        for agent in agents {
            if agent.radius_index != expected {
                return Err(GroupError::MixedRadii {
                    expected,
                    found: agent.radius_index,
                }
                .into());
            }
        }

        // Both half-edges of a corridor describe the same cell, so key
        // subgroups by the lower twin.
        let mut subgroups: BTreeMap<Option<EdgeId>, Vec<usize>> = BTreeMap::new();
        for (index, agent) in agents.iter().enumerate() {
            let cell = match graph.nearest_edge(agent.position) {
                Some(edge) => Some(edge.min(graph.edge(edge)?.twin)),
                None => None,
            };
            subgroups.entry(cell).or_default().push(index);
        }

        let mut plan = GroupPlan::default();
        for (cell, members) in &subgroups {
            let Some(cell) = *cell else {
                // No graph under these agents at all.
                for member in members {
                    plan.routes.push(AgentRoute {
                        agent: *member,
                        waypoints: Vec::new(),
                        left_distance: 0.0,
                        right_distance: 0.0,
                    });
                }
                continue;
            };
            // Each entry vertex is anchored by the member standing
            // closest to it, so the shared corridor leaves the cell on
            // the side where the group actually is.
            let leader = agents[members[0]];
            let edge_ref = graph.edge(cell)?;
            let anchors = [
                (
                    edge_ref.start,
                    nearest_member(agents, members, graph.vertex(edge_ref.start)?.position),
                ),
                (
                    edge_ref.end,
                    nearest_member(agents, members, graph.vertex(edge_ref.end)?.position),
                ),
            ];
            let shared = planning::plan(
                graph,
                leader.position,
                &anchors,
                self.goal,
                Some(expected),
                self.expansion_limit,
            )?;
            plan.searches += 1;

            let oriented = oriented_exit(graph, cell, &shared.corridor)?;
            let edge = graph.edge(oriented)?;
            let right_site = graph.site(edge.site)?;
            let left_site = graph.site(graph.edge(edge.twin)?.site)?;
            for member in members {
                let position = agents[*member].position;
                let mut waypoints = shared.waypoints.clone();
                if let Some(first) = waypoints.first_mut() {
                    *first = position;
                }
                plan.routes.push(AgentRoute {
                    agent: *member,
                    waypoints,
                    left_distance: left_site.distance_to(position),
                    right_distance: right_site.distance_to(position),
                });
            }
        }
        plan.routes.sort_by_key(|route| route.agent);
        debug!(
            agents = agents.len(),
            subgroups = subgroups.len(),
            searches = plan.searches,
            "planned group routes"
        );
        Ok(plan)
    }
}

/// Position of the subgroup member closest to an entry vertex.
fn nearest_member(agents: &[Agent], members: &[usize], vertex: Point2) -> Point2 {
    let mut best = agents[members[0]].position;
    let mut best_distance = (best - vertex).norm();
    for member in &members[1..] {
        let position = agents[*member].position;
        let distance = (position - vertex).norm();
        if distance < best_distance {
            best = position;
            best_distance = distance;
        }
    }
    best
}

/// Picks the half-edge of the starting cell aligned with the travel
/// direction: the one ending at the vertex the shared path leaves
/// through.
fn oriented_exit(graph: &CorridorGraph, cell: EdgeId, corridor: &[EdgeId]) -> Result<EdgeId> {
    let edge = graph.edge(cell)?;
    let Some(first) = corridor.first() else {
        return Ok(cell);
    };
    let exit = graph.edge(*first)?.start;
    if edge.end == exit {
        Ok(cell)
    } else {
        Ok(edge.twin)
    }
}
