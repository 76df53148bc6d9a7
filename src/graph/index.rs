use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::VertexId;
use crate::math::{Point2, Rect};

/// Entry of the vertex nearest-neighbour index.
#[derive(Debug, Clone, PartialEq)]
struct PointEntry {
    key: [f64; 2],
    id: VertexId,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.key)
    }
}

impl PointDistance for PointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.key[0] - point[0];
        let dy = self.key[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-neighbour index over vertex positions.
///
/// Backed by an R-tree; lookups are expected sub-linear in the vertex
/// count.
#[derive(Debug, Default)]
pub(crate) struct NearestPointIndex {
    tree: RTree<PointEntry>,
}

impl NearestPointIndex {
    pub fn insert(&mut self, id: VertexId, position: Point2) {
        self.tree.insert(PointEntry {
            key: [position.x, position.y],
            id,
        });
    }

    pub fn remove(&mut self, id: VertexId, position: Point2) {
        self.tree.remove(&PointEntry {
            key: [position.x, position.y],
            id,
        });
    }

    pub fn nearest(&self, p: Point2) -> Option<VertexId> {
        self.tree.nearest_neighbor(&[p.x, p.y]).map(|e| e.id)
    }

    pub fn nearest_k(&self, p: Point2, k: usize) -> Vec<VertexId> {
        self.tree
            .nearest_neighbor_iter(&[p.x, p.y])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}

/// Entry of a bounding-box range index.
#[derive(Debug, Clone, PartialEq)]
struct BoxEntry<T> {
    min: [f64; 2],
    max: [f64; 2],
    id: T,
}

impl<T> RTreeObject for BoxEntry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Range index over axis-aligned boxes, keyed by an id type.
///
/// Search results are sorted by id so callers iterate candidates in a
/// deterministic order.
#[derive(Debug)]
pub(crate) struct RangeIndex<T> {
    tree: RTree<BoxEntry<T>>,
}

impl<T> Default for RangeIndex<T>
where
    T: PartialEq + Ord + Copy,
{
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl<T> RangeIndex<T>
where
    T: PartialEq + Ord + Copy,
{
    pub fn insert(&mut self, id: T, bounds: &Rect) {
        self.tree.insert(BoxEntry {
            min: [bounds.min.x, bounds.min.y],
            max: [bounds.max.x, bounds.max.y],
            id,
        });
    }

    pub fn remove(&mut self, id: T, bounds: &Rect) {
        self.tree.remove(&BoxEntry {
            min: [bounds.min.x, bounds.min.y],
            max: [bounds.max.x, bounds.max.y],
            id,
        });
    }

    pub fn search(&self, bounds: &Rect) -> Vec<T> {
        let envelope = AABB::from_corners(
            [bounds.min.x, bounds.min.y],
            [bounds.max.x, bounds.max.y],
        );
        let mut ids: Vec<T> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn search_at(&self, p: Point2) -> Vec<T> {
        let mut ids: Vec<T> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([p.x, p.y]))
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}
