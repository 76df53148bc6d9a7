use super::{Point2, Vector2, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Densifies a parabolic arc between two known arc points.
///
/// A corridor edge bounded by a point site on one side and a segment
/// site on the other follows the parabola with the point as focus and
/// the segment's carrier line as directrix. The returned polyline runs
/// from `p0` to `p1` with intermediate points inserted until the chord
/// deviation drops below `max_distance`.
///
/// # Errors
///
/// Returns `GeometryError::InvalidSampleStep` when `max_distance` is not
/// positive, and `GeometryError::Degenerate` when the directrix has zero
/// length or the focus lies on it.
pub fn densify_parabola(
    focus: Point2,
    directrix_a: Point2,
    directrix_b: Point2,
    p0: Point2,
    p1: Point2,
    max_distance: f64,
) -> Result<Vec<Point2>> {
    if max_distance <= 0.0 {
        return Err(GeometryError::InvalidSampleStep(max_distance).into());
    }
    let axis = directrix_b - directrix_a;
    let len = axis.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate("zero-length directrix".into()).into());
    }
    let u = axis / len;
    let mut n = Vector2::new(-u.y, u.x);
    // Orient the frame so the focus sits on the positive side.
    let mut fy = (focus - directrix_a).dot(&n);
    if fy < 0.0 {
        n = -n;
        fy = -fy;
    }
    if fy < TOLERANCE {
        return Err(GeometryError::Degenerate("focus lies on the directrix".into()).into());
    }
    let fx = (focus - directrix_a).dot(&u);

    let frame = Frame {
        origin: directrix_a,
        u,
        n,
        fx,
        fy,
    };
    let x0 = (p0 - directrix_a).dot(&u);
    let x1 = (p1 - directrix_a).dot(&u);

    let mut out = vec![p0];
    subdivide(&frame, x0, x1, max_distance, 0, &mut out);
    out.push(p1);
    Ok(out)
}

struct Frame {
    origin: Point2,
    u: Vector2,
    n: Vector2,
    fx: f64,
    fy: f64,
}

impl Frame {
    /// Evaluates the parabola at directrix parameter `x`.
    fn at(&self, x: f64) -> Point2 {
        let dx = x - self.fx;
        let y = (dx * dx + self.fy * self.fy) / (2.0 * self.fy);
        self.origin + self.u * x + self.n * y
    }
}

fn subdivide(frame: &Frame, x0: f64, x1: f64, max_distance: f64, depth: u32, out: &mut Vec<Point2>) {
    if depth >= 16 {
        return;
    }
    let xm = 0.5 * (x0 + x1);
    let a = frame.at(x0);
    let b = frame.at(x1);
    let mid = frame.at(xm);
    let chord_mid = nalgebra::center(&a, &b);
    if (mid - chord_mid).norm() > max_distance {
        subdivide(frame, x0, xm, max_distance, depth + 1, out);
        out.push(mid);
        subdivide(frame, xm, x1, max_distance, depth + 1, out);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{CorridorError, GeometryError};

    // Focus (0, 2) over the x-axis directrix: parabola y = (x^2 + 4) / 4.
    fn arc(max_distance: f64) -> Vec<Point2> {
        densify_parabola(
            Point2::new(0.0, 2.0),
            Point2::new(-10.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(-4.0, 5.0),
            Point2::new(4.0, 5.0),
            max_distance,
        )
        .unwrap()
    }

    #[test]
    fn samples_lie_on_parabola() {
        let pts = arc(0.01);
        assert!(pts.len() > 2, "expected refinement, got {}", pts.len());
        for p in &pts {
            let expected = (p.x * p.x + 4.0) / 4.0;
            assert!((p.y - expected).abs() < 1e-9, "off-curve point {p:?}");
        }
    }

    #[test]
    fn coarser_step_yields_fewer_points() {
        assert!(arc(0.01).len() > arc(1.0).len());
    }

    #[test]
    fn endpoints_are_preserved() {
        let pts = arc(0.5);
        assert_eq!(pts[0], Point2::new(-4.0, 5.0));
        assert_eq!(pts[pts.len() - 1], Point2::new(4.0, 5.0));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let err = densify_parabola(
            Point2::new(0.0, 2.0),
            Point2::new(-1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.25),
            0.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CorridorError::Geometry(GeometryError::InvalidSampleStep(_))
        ));
    }

    #[test]
    fn focus_on_directrix_is_degenerate() {
        let err = densify_parabola(
            Point2::new(0.0, 0.0),
            Point2::new(-1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
            0.1,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CorridorError::Geometry(GeometryError::Degenerate(_))
        ));
    }
}
