use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the structure contour geometry engine.
#[derive(Debug, Error)]
pub enum RtGeomError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl RtGeomError {
    /// Returns `true` if a simpler fallback algorithm may be attempted after
    /// this error.
    ///
    /// Deadline expiry and cancellation are reported failures, as is a lookup
    /// of a missing structure. Numerical failures are recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Geometry(_) => true,
            Self::Operation(err) => !matches!(
                err,
                OperationError::DeadlineExceeded { .. }
                    | OperationError::Cancelled
                    | OperationError::NotFound(_)
            ),
            Self::Worker(_) => false,
        }
    }
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("coordinate {value} exceeds the fixed-precision range of +/-{limit}")]
    CoordinateOutOfRange { value: f64, limit: f64 },

    #[error("non-finite coordinate")]
    NonFinite,
}

/// Errors related to engine operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("operation failed: {0}")]
    Failed(String),

    #[error("working grid of {cells} cells exceeds the limit of {limit}")]
    GridTooLarge { cells: usize, limit: usize },

    #[error("deadline exceeded after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    #[error("operation superseded by a newer request")]
    Cancelled,
}

/// Errors related to background job dispatch.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job {job} timed out after {after:?}")]
    Timeout { job: u64, after: Duration },

    #[error("job {job} panicked")]
    Panicked { job: u64 },

    #[error("job {job} was aborted before completion")]
    Aborted { job: u64 },
}

/// Convenience type alias for results using [`RtGeomError`].
pub type Result<T> = std::result::Result<T, RtGeomError>;
