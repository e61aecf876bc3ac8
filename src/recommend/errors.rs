use thiserror::Error;

/// Errors returned by the recommendation operations.
///
/// All of them but `StoreUnavailable` are caused by the caller's input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("Song '{0}' not found in the dataset.")]
    NotFound(String),

    #[error("Invalid mood provided: '{0}'.")]
    InvalidMood(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RecommendError {
    /// Short label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::NotFound(_) => "not_found",
            RecommendError::InvalidMood(_) => "invalid_mood",
            RecommendError::InvalidArgument(_) => "invalid_argument",
            RecommendError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
