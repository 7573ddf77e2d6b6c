//! Error types of the geometry kernel.
//!
//! Bad input, stage failures of the conforming pipeline and exhausted loop caps are distinct variants,
//! so callers can decide whether a retry with a larger tolerance makes sense.

use core::fmt;

use thiserror::Error;

use crate::utils::vec2::Vec2;

/// The stages of the conforming Delaunay pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    IntersectionDiscovery,
    VertexMerge,
    Triangulation,
    ConstraintRecovery,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntersectionDiscovery => write!(f, "intersection-discovery"),
            Self::VertexMerge => write!(f, "vertex-merge"),
            Self::Triangulation => write!(f, "triangulation"),
            Self::ConstraintRecovery => write!(f, "constraint-recovery"),
        }
    }
}

/// Errors that can occur while triangulating or intersecting.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The input cannot be processed, e.g. too few points or a zero-length edge.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stage of the conforming pipeline failed.
    #[error("triangulation failed during {stage}: {source}")]
    TriangulationFailed {
        /// The failing stage
        stage: Stage,
        /// What went wrong inside the stage
        #[source]
        source: Box<GeometryError>,
    },

    /// A constraint edge could not be restored by edge flips.
    #[error("could not recover constraint edge {from} -> {to}, {remaining} crossing edges left")]
    ConstraintRecoveryFailure {
        /// Start of the constraint edge
        from: Vec2,
        /// End of the constraint edge
        to: Vec2,
        /// Number of triangulation edges still crossing the constraint
        remaining: usize,
    },

    /// An explicit iteration cap was exhausted.
    #[error("{what} did not converge within {limit} iterations")]
    IterationLimit {
        /// The loop that hit its cap
        what: &'static str,
        /// The cap
        limit: usize,
    },

    /// Structural error of the mesh data structure.
    #[error(transparent)]
    Internal(anyhow::Error),
}

/// A specialized `Result` type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;

impl GeometryError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn failed(stage: Stage, source: Self) -> Self {
        Self::TriangulationFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `TriangulationFailed`.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::TriangulationFailed { source, .. } => source.root_cause(),
            _ => self,
        }
    }

    /// The pipeline stage that failed, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::TriangulationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns `true` if the root cause is bad input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.root_cause(), Self::InvalidInput(_))
    }

    /// Returns `true` if the root cause is a constraint edge that could not be recovered.
    #[must_use]
    pub fn is_constraint_recovery_failure(&self) -> bool {
        matches!(self.root_cause(), Self::ConstraintRecoveryFailure { .. })
    }
}

impl From<anyhow::Error> for GeometryError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(geometry_error) => geometry_error,
            Err(err) => Self::Internal(err),
        }
    }
}
