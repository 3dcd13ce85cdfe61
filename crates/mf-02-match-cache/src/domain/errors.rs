use std::time::Duration;
use thiserror::Error;

/// Cache backend failures. Never surfaced past [`crate::MatchCache`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cached value could not be decoded: {0}")]
    Corrupt(String),
}
