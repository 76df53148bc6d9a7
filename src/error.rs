use thiserror::Error;

/// Top-level error type for the corridor map kernel.
#[derive(Debug, Error)]
pub enum CorridorError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Group(#[from] GroupError),
}

/// Errors related to geometric computations and malformed input geometry.
///
/// Construction-time geometry errors are fatal: inputs are rejected,
/// never silently normalized.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("inverted rectangle: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvertedRectangle {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("cannot compute a bounding rectangle of an empty point set")]
    EmptyPointSet,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("sample step {0} must be greater than zero")]
    InvalidSampleStep(f64),
}

/// Errors related to the corridor graph and its Voronoi-primitive input.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The upstream primitive handed over an edge without a finite
    /// endpoint. Unbounded rays must be excluded or clipped upstream.
    #[error("diagram edge {0} has an unbounded endpoint")]
    UnboundedInput(usize),

    #[error("diagram edge {edge} references twin {twin}, whose twin is not {edge}")]
    MissingTwin { edge: usize, twin: usize },

    #[error("diagram edge {edge} references site index {site} out of range")]
    SiteOutOfRange { edge: usize, site: usize },

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("radius index {0} has not been registered on this graph")]
    UnregisteredRadius(usize),

    #[error("diagram source does not support segment sites")]
    SegmentSitesUnsupported,
}

/// Errors related to incremental graph updates.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The localized patch cannot be proven to bound every affected edge.
    /// The live graph is left untouched; callers must fall back to a full
    /// rebuild.
    #[error("localized patch cannot bound all affected edges: {0}")]
    PatchIncomplete(String),
}

/// Errors related to path planning.
///
/// "No path" is not an error: searches return an empty path instead.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("search exceeded the expansion limit of {0}")]
    ExpansionLimit(usize),
}

/// Errors related to group planning requests.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Caller-contract violation: agents of differing radius may not share
    /// a group request. Distinct from any planning failure.
    #[error("agents in one group must share a radius index (expected {expected}, found {found})")]
    MixedRadii { expected: usize, found: usize },
}

/// Convenience type alias for results using [`CorridorError`].
pub type Result<T> = std::result::Result<T, CorridorError>;
