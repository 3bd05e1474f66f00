use thiserror::Error;

use crate::parser::traits::ParseError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Deadline passed while waiting for the rate limit reset")]
    DeadlineExceeded,
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Unsupported ecosystem: {0}")]
    UnsupportedEcosystem(String),

    #[error("Unsupported VCS host: {0}")]
    UnsupportedVcsHost(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
