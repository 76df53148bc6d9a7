use crate::math::{Point2, TOLERANCE};

/// One gate of the corridor: the obstacle contacts left and right of the
/// travel direction. The first and last portals are degenerate, carrying
/// the start and goal points on both sides.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Portal {
    pub left: Point2,
    pub right: Point2,
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Positive when `c` lies to the right of the directed line `a` to `b`.
fn signed_area(a: Point2, b: Point2, c: Point2) -> f64 {
    (c.x - a.x) * (b.y - a.y) - (b.x - a.x) * (c.y - a.y)
}

/// Pulls the shortest path through a portal sequence (funnel algorithm).
///
/// The funnel keeps an apex and two rails; a portal side that would
/// cross the opposite rail commits the opposite corner as a waypoint and
/// restarts the scan from it. Output starts at the first portal's point
/// and ends at the last portal's point.
pub(crate) fn string_pull(portals: &[Portal]) -> Vec<Point2> {
    let mut path = Vec::new();
    let Some(first) = portals.first() else {
        return path;
    };
    let mut apex = first.right;
    let mut left = first.left;
    let mut right = first.right;
    let mut left_index = 0usize;
    let mut right_index = 0usize;
    path.push(apex);

    let mut i = 1;
    while i < portals.len() {
        let portal = portals[i];

        if signed_area(apex, right, portal.right) <= 0.0 {
            if (apex - right).norm() < TOLERANCE || signed_area(apex, left, portal.right) > 0.0 {
                right = portal.right;
                right_index = i;
            } else {
                // The right side crossed the left rail: the left corner
                // becomes the next waypoint and the funnel restarts there.
                path.push(left);
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        if signed_area(apex, left, portal.left) >= 0.0 {
            if (apex - left).norm() < TOLERANCE || signed_area(apex, right, portal.left) < 0.0 {
                left = portal.left;
                left_index = i;
            } else {
                path.push(right);
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }

    // The last portal is the goal point; emit it unless the scan already
    // committed it.
    if let Some(last) = portals.last() {
        let arrived = path
            .last()
            .is_some_and(|p| (*p - last.left).norm() < TOLERANCE);
        if !arrived {
            path.push(last.left);
        }
    }
    path
}
