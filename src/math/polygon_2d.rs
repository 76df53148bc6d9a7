use super::Point2;

/// Tests whether `p` lies inside a simple polygon using ray casting.
///
/// The edge test is half-open (`<=` on one y-comparison, `<` on the
/// other) so a crossing through a shared polygon vertex is counted
/// exactly once. Polygons with fewer than three points contain nothing.
#[must_use]
pub fn polygon_contains_point(polygon: &[Point2], p: Point2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if ((a.y <= p.y && p.y < b.y) || (b.y <= p.y && p.y < a.y))
            && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Winding-number containment test.
///
/// Slower than [`polygon_contains_point`]; kept as an independent oracle
/// for validating the ray-cast predicate.
#[must_use]
pub fn winding_number_contains(polygon: &[Point2], p: Point2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut winding = 0i32;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[j];
        let b = polygon[i];
        if a.y <= p.y {
            if b.y > p.y && is_left(a, b, p) > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && is_left(a, b, p) < 0.0 {
            winding -= 1;
        }
        j = i;
    }
    winding != 0
}

fn is_left(a: Point2, b: Point2, p: Point2) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise winding. Diagnostics only.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}
