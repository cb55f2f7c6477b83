//! Construction-time errors. Stepping a world never fails; everything that could
//! make a step misbehave is rejected when shapes and bodies are built.

use thiserror::Error;

/// Errors raised while building shapes, bodies or world configuration.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PhysicsError {
    #[error("circle radius must be positive and finite, got {0}")]
    NonPositiveRadius(f32),

    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("polygon supports at most {max} vertices, got {got}")]
    TooManyVertices { got: usize, max: usize },

    /// All input points are collinear (or coincident), so the hull collapses.
    #[error("convex hull of the input points has only {0} vertices")]
    DegenerateHull(usize),

    #[error("polygon area must be positive, got {0}")]
    DegenerateArea(f32),

    #[error("density must be positive and finite, got {0}")]
    NonPositiveDensity(f32),

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("invalid world config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
