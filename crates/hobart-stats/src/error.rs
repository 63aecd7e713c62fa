//! Errors raised by the numerical engines.

use thiserror::Error;

/// Errors that can occur while fitting a model.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Design matrix has no unique least-squares solution
    #[error("Singular matrix: {0}")]
    Singular(String),

    /// Input has no variance to decompose
    #[error("Degenerate data: {0}")]
    Degenerate(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Probability distribution could not be constructed
    #[error("Distribution error: {0}")]
    Distribution(String),
}
