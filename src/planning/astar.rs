use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use tracing::trace;

use crate::error::{PlanError, Result};
use crate::graph::{CorridorGraph, EdgeId, VertexId};
use crate::math::Point2;

/// A* over the corridor graph, seeded from both endpoints of the start
/// cell and accepting either endpoint of the goal cell.
///
/// Seeding both endpoints lets the search leave the start cell in
/// whichever direction is cheaper instead of committing to one vertex up
/// front. The heuristic is the Euclidean distance to the goal point,
/// which stays admissible because edge costs are chord lengths.
///
/// `anchors` overrides the seed position per start-cell vertex: a group
/// request anchors each entry vertex with the member standing closest to
/// it. Vertices without an anchor seed from `start`.
pub(crate) struct CorridorSearch<'a> {
    pub graph: &'a CorridorGraph,
    pub radius: f64,
    pub expansion_limit: Option<usize>,
    pub anchors: &'a [(VertexId, Point2)],
}

/// A successful search: traversed half-edges in travel order, the cost
/// accumulated up to the goal-cell entry vertex, and the number of
/// vertex expansions.
#[derive(Debug)]
pub(crate) struct SearchOutcome {
    pub corridor: Vec<EdgeId>,
    pub cost: f64,
    pub expanded: usize,
}

struct QueueEntry {
    estimate: f64,
    vertex: VertexId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed for a min-heap; ties break toward the lowest vertex id so
    // runs are reproducible.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl CorridorSearch<'_> {
    /// Runs the search. `None` means the goal cell is unreachable at
    /// this radius.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ExpansionLimit`] when the expansion budget is
    /// exhausted before the goal cell is reached.
    pub fn run(
        &self,
        start_edge: EdgeId,
        start: Point2,
        goal_edge: EdgeId,
        goal: Point2,
    ) -> Result<Option<SearchOutcome>> {
        let start_ref = self.graph.edge(start_edge)?;
        let goal_ref = self.graph.edge(goal_edge)?;
        let goals = [goal_ref.start, goal_ref.end];

        let mut open = BinaryHeap::new();
        let mut g_score: BTreeMap<VertexId, f64> = BTreeMap::new();
        let mut came_from: BTreeMap<VertexId, (VertexId, EdgeId)> = BTreeMap::new();
        let seeds = [
            (start_ref.start, start_ref.start_position()),
            (start_ref.end, start_ref.end_position()),
        ];
        for (vertex, position) in seeds {
            let from = self
                .anchors
                .iter()
                .find(|(anchored, _)| *anchored == vertex)
                .map_or(start, |(_, position)| *position);
            let g = (position - from).norm();
            if g_score.get(&vertex).map_or(true, |old| g < *old) {
                g_score.insert(vertex, g);
                open.push(QueueEntry {
                    estimate: g + (position - goal).norm(),
                    vertex,
                });
            }
        }

        let mut closed: BTreeSet<VertexId> = BTreeSet::new();
        let mut expanded = 0usize;
        while let Some(QueueEntry { vertex, .. }) = open.pop() {
            if !closed.insert(vertex) {
                continue;
            }
            if let Some(limit) = self.expansion_limit {
                if expanded >= limit {
                    return Err(PlanError::ExpansionLimit(limit).into());
                }
            }
            expanded += 1;

            if goals.contains(&vertex) {
                trace!(%vertex, expanded, "corridor search reached the goal cell");
                return Ok(Some(Self::reconstruct(
                    vertex, &g_score, &came_from, expanded,
                )));
            }

            let current = g_score.get(&vertex).copied().unwrap_or(f64::INFINITY);
            for edge_id in self.graph.vertex(vertex)?.edges.clone() {
                let edge = self.graph.edge(edge_id)?;
                if !edge.has_enough_clearance(self.radius) {
                    continue;
                }
                let next = edge.end;
                let tentative = current + edge.cost;
                if g_score.get(&next).map_or(true, |old| tentative < *old) {
                    g_score.insert(next, tentative);
                    came_from.insert(next, (vertex, edge_id));
                    let h = (self.graph.vertex(next)?.position - goal).norm();
                    open.push(QueueEntry {
                        estimate: tentative + h,
                        vertex: next,
                    });
                }
            }
        }
        trace!(expanded, "corridor search exhausted the open set");
        Ok(None)
    }

    fn reconstruct(
        goal_vertex: VertexId,
        g_score: &BTreeMap<VertexId, f64>,
        came_from: &BTreeMap<VertexId, (VertexId, EdgeId)>,
        expanded: usize,
    ) -> SearchOutcome {
        let cost = g_score.get(&goal_vertex).copied().unwrap_or(f64::INFINITY);
        let mut corridor = Vec::new();
        let mut current = goal_vertex;
        while let Some((previous, edge)) = came_from.get(&current) {
            corridor.push(*edge);
            current = *previous;
        }
        corridor.reverse();
        SearchOutcome {
            corridor,
            cost,
            expanded,
        }
    }
}
