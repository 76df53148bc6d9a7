use super::Point2;

/// Returns the closest point on the segment `a`-`b` to `p`, along with
/// the distance to it.
#[must_use]
pub fn closest_point_on_segment(a: Point2, b: Point2, p: Point2) -> (Point2, f64) {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (a, (p - a).norm());
    }

    // Project the point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    let closest = a + d * t;
    (closest, (p - closest).norm())
}

/// Returns the minimum distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn point_to_segment_dist(a: Point2, b: Point2, p: Point2) -> f64 {
    closest_point_on_segment(a, b, p).1
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn perpendicular_projection() {
        // Point (1, 1) to segment (0,0)->(2,0). Closest at (1,0), dist = 1.
        let (c, d) = closest_point_on_segment(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
        );
        assert!((c - Point2::new(1.0, 0.0)).norm() < TOL);
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn endpoint_closest() {
        // Point (-1, 0) clamps to segment start.
        let (c, d) = closest_point_on_segment(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(-1.0, 0.0),
        );
        assert!((c - Point2::new(0.0, 0.0)).norm() < TOL);
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn degenerate_segment() {
        let d = point_to_segment_dist(
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 4.0),
        );
        assert!((d - 5.0).abs() < TOL, "d={d}");
    }
}
