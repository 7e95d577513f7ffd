use thiserror::Error;

/// Error types for clustering sessions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansError {
    /// The number of clusters k is invalid (must be >= 1, and <= n for sampled methods)
    #[error("Invalid k value: {0}")]
    InvalidK(String),

    /// Manual initialization received the wrong number of centroids
    #[error("Manual initialization expected {expected} centroids, got {got}")]
    ManualCountMismatch { expected: usize, got: usize },

    /// Step or converge was requested before a successful init
    #[error("Session has not been initialized. Call init() first.")]
    NotInitialized,

    /// Input is not a set of 2-D points
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),

    /// A coordinate was NaN or infinite
    #[error("Non-finite coordinate: {0}")]
    NonFiniteCoordinate(String),
}

impl KMeansError {
    /// Stable machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            KMeansError::InvalidK(_) => "invalid_k",
            KMeansError::ManualCountMismatch { .. } => "manual_count_mismatch",
            KMeansError::NotInitialized => "not_initialized",
            KMeansError::InvalidDimensions(_) => "invalid_dimensions",
            KMeansError::NonFiniteCoordinate(_) => "non_finite_coordinate",
        }
    }
}
