pub mod error;
pub mod graph;
pub mod group;
pub mod math;
pub mod planning;
pub mod update;
pub mod voronoi;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{CorridorError, Result};
