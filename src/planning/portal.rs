use super::funnel::Portal;
use crate::error::{GraphError, Result};
use crate::graph::{CorridorGraph, Edge, EdgeId};
use crate::math::polygon_2d::polygon_contains_point;
use crate::math::{Point2, TOLERANCE};

/// Assembles the portal sequence for a traversed corridor.
///
/// The sequence opens and closes with degenerate portals at the start
/// and goal points. In between, each traversed half-edge contributes the
/// contacts at its start vertex; the final edge also contributes its end
/// contacts when the goal lies beyond its cell. Leading edges whose cell
/// still contains the start are behind the agent and are skipped, as are
/// consecutive duplicate gates.
pub(crate) fn build_portals(
    graph: &CorridorGraph,
    corridor: &[EdgeId],
    start: Point2,
    goal: Point2,
    radius_index: Option<usize>,
) -> Result<Vec<Portal>> {
    let mut portals = vec![Portal {
        left: start,
        right: start,
    }];

    let mut index = 0;
    while index < corridor.len()
        && polygon_contains_point(&graph.edge(corridor[index])?.cell, start)
    {
        index += 1;
    }

    let mut last_edge = None;
    let mut goal_reached = false;
    for id in &corridor[index..] {
        let edge = graph.edge(*id)?;
        let (left, right) = start_contacts(edge, radius_index)?;
        push_portal(&mut portals, left, right);
        last_edge = Some(edge);
        if polygon_contains_point(&edge.cell, goal) {
            goal_reached = true;
            break;
        }
    }
    if let Some(edge) = last_edge {
        if !goal_reached {
            let (left, right) = end_contacts(edge, radius_index)?;
            push_portal(&mut portals, left, right);
        }
    }

    portals.push(Portal {
        left: goal,
        right: goal,
    });
    Ok(portals)
}

fn start_contacts(edge: &Edge, radius_index: Option<usize>) -> Result<(Point2, Point2)> {
    match radius_index {
        None => Ok((edge.left_of_start, edge.right_of_start)),
        Some(index) => {
            let property = edge
                .property(index)
                .ok_or(GraphError::UnregisteredRadius(index))?;
            Ok((property.left_of_start, property.right_of_start))
        }
    }
}

fn end_contacts(edge: &Edge, radius_index: Option<usize>) -> Result<(Point2, Point2)> {
    match radius_index {
        None => Ok((edge.left_of_end, edge.right_of_end)),
        Some(index) => {
            let property = edge
                .property(index)
                .ok_or(GraphError::UnregisteredRadius(index))?;
            Ok((property.left_of_end, property.right_of_end))
        }
    }
}

fn push_portal(portals: &mut Vec<Portal>, left: Point2, right: Point2) {
    if let Some(last) = portals.last() {
        if (last.left - left).norm() < TOLERANCE && (last.right - right).norm() < TOLERANCE {
            return;
        }
    }
    portals.push(Portal { left, right });
}
