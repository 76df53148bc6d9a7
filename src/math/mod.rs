pub mod distance_2d;
pub mod parabola_2d;
pub mod polygon_2d;
pub mod rect_2d;

pub use rect_2d::Rect;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;
