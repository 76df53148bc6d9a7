//! Shared test map: four square rooms inside a bordered arena.
//!
//! The corridor skeleton is a cross between the rooms plus a rim ring,
//! supplied as a precomputed diagram so tests exercise segment-site
//! geometry without a native segment-Voronoi backend.

#![allow(clippy::unwrap_used)]

use crate::graph::{CorridorGraph, ObstacleShape};
use crate::math::{Point2, Rect};
use crate::voronoi::{Diagram, DiagramEdge, DiagramVertex, StaticSource};

/// Border at +-75, rooms spanning 10..40 on each quadrant.
///
/// Sites land in registration order: border walls 0..=3, then four walls
/// per room (north-east 4..=7, north-west 8..=11, south-west 12..=15,
/// south-east 16..=19). The diagram below references them by index.
pub(crate) fn four_rooms() -> CorridorGraph {
    let mut graph = CorridorGraph::new();
    graph
        .add_border(&Rect::new(Point2::new(-75.0, -75.0), Point2::new(75.0, 75.0)).unwrap());
    for room in [
        [(10.0, 10.0), (40.0, 10.0), (40.0, 40.0), (10.0, 40.0)],
        [(-40.0, 10.0), (-10.0, 10.0), (-10.0, 40.0), (-40.0, 40.0)],
        [(-40.0, -40.0), (-10.0, -40.0), (-10.0, -10.0), (-40.0, -10.0)],
        [(10.0, -40.0), (40.0, -40.0), (40.0, -10.0), (10.0, -10.0)],
    ] {
        let polygon = room.iter().map(|(x, y)| Point2::new(*x, *y)).collect();
        graph.add_obstacle(&ObstacleShape::Polygon(polygon)).unwrap();
    }
    graph.construct(&StaticSource::new(four_rooms_diagram())).unwrap();
    graph
}

fn four_rooms_diagram() -> Diagram {
    let positions = [
        (0.0, 0.0),     // 0: center junction
        (0.0, 57.5),    // 1: north junction
        (57.5, 0.0),    // 2: east junction
        (0.0, -57.5),   // 3: south junction
        (-57.5, 0.0),   // 4: west junction
        (57.5, 57.5),   // 5: north-east rim
        (-57.5, 57.5),  // 6: north-west rim
        (-57.5, -57.5), // 7: south-west rim
        (57.5, -57.5),  // 8: south-east rim
    ];
    // (start, end, right site of the forward direction, right site of
    // the backward direction).
    let corridors = [
        (0, 1, 7, 9),   // center..north, between the upper rooms
        (0, 2, 18, 4),  // center..east
        (0, 3, 13, 19), // center..south
        (0, 4, 8, 14),  // center..west
        (1, 5, 6, 1),   // north..north-east rim
        (2, 5, 2, 5),   // east..north-east rim
        (1, 6, 1, 10),  // north..north-west rim
        (4, 6, 11, 0),  // west..north-west rim
        (4, 7, 0, 15),  // west..south-west rim
        (3, 7, 12, 3),  // south..south-west rim
        (3, 8, 3, 16),  // south..south-east rim
        (2, 8, 17, 2),  // east..south-east rim
    ];

    let mut diagram = Diagram::default();
    for (x, y) in positions {
        diagram.vertices.push(DiagramVertex {
            position: Point2::new(x, y),
        });
    }
    for (start, end, forward_site, backward_site) in corridors {
        let index = diagram.edges.len();
        diagram.edges.push(DiagramEdge {
            start: Some(start),
            end: Some(end),
            twin: index + 1,
            is_linear: true,
            site: forward_site,
        });
        diagram.edges.push(DiagramEdge {
            start: Some(end),
            end: Some(start),
            twin: index,
            is_linear: true,
            site: backward_site,
        });
    }
    diagram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::polygon_contains_point;
    use approx::assert_relative_eq;

    #[test]
    fn fixture_topology_is_consistent() {
        let graph = four_rooms();
        assert_eq!(graph.vertex_count(), 9);
        assert_eq!(graph.edge_count(), 24);
        for (id, edge) in graph.edges() {
            let twin = graph.edge(edge.twin).unwrap();
            assert_eq!(twin.twin, id);
            assert_eq!(twin.start, edge.end);
            assert!(graph.vertex(edge.start).unwrap().edges.contains(&id));
        }
    }

    #[test]
    fn east_rim_cell_holds_the_upper_right_pocket() {
        let graph = four_rooms();
        let p = Point2::new(55.0, 55.0);
        let id = graph.nearest_edge(p).unwrap();
        let edge = graph.edge(id).unwrap();
        assert!(polygon_contains_point(&edge.cell, p));
        // Bounded by the east border wall and the north-east room.
        assert_relative_eq!(edge.right_of_start.x, 75.0, epsilon = 1e-9);
        assert_relative_eq!(edge.left_of_start.x, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn corner_queries_fall_back_to_the_nearest_junction() {
        let graph = four_rooms();
        let id = graph.nearest_edge(Point2::new(-75.0, -75.0)).unwrap();
        let edge = graph.edge(id).unwrap();
        let rim = graph.vertex(edge.start).unwrap();
        assert_relative_eq!(rim.position.x, -57.5, epsilon = 1e-9);
        assert_relative_eq!(rim.position.y, -57.5, epsilon = 1e-9);
    }

    #[test]
    fn room_walls_trim_the_crossing_clearances() {
        let graph = four_rooms();
        // The center..east corridor runs between the two right-hand
        // rooms; at the center its clearance reaches the room corners.
        let id = graph.nearest_edge(Point2::new(30.0, 0.0)).unwrap();
        let edge = graph.edge(id).unwrap();
        assert_relative_eq!(edge.width_of_start, 10.0, epsilon = 1e-9);
    }
}
