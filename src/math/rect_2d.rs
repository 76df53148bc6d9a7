use super::Point2;
use crate::error::{GeometryError, Result};

/// An axis-aligned rectangle, used as a conservative envelope around
/// cell polygons and obstacles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Rect {
    /// Creates a rectangle from its corners.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvertedRectangle` if `min` exceeds `max`
    /// on either axis. Inverted input is rejected, never reordered.
    pub fn new(min: Point2, max: Point2) -> Result<Self> {
        if min.x > max.x || min.y > max.y {
            return Err(GeometryError::InvertedRectangle {
                min_x: min.x,
                min_y: min.y,
                max_x: max.x,
                max_y: max.y,
            }
            .into());
        }
        Ok(Self { min, max })
    }

    /// Computes the bounding rectangle of a point set.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::EmptyPointSet` for an empty slice.
    pub fn from_points(points: &[Point2]) -> Result<Self> {
        let first = points.first().ok_or(GeometryError::EmptyPointSet)?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Ok(Self { min, max })
    }

    /// Returns this rectangle grown by a uniform margin on every side.
    #[must_use]
    pub fn extended(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Tests whether two rectangles overlap (closed-interval test).
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Tests whether a point lies within the rectangle (boundary included).
    #[must_use]
    pub fn contains_point(&self, p: Point2) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    /// Euclidean distance from the rectangle to a point, zero inside.
    #[must_use]
    pub fn distance_to(&self, p: Point2) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        dx.hypot(dy)
    }
}
