//! Error types for Repute

use crate::indexer::IndexerError;

/// Main error type for Repute operations
///
/// Eligibility no-ops (self-dealing, repeat tips, duplicate deliveries) are
/// never errors; they surface as [`crate::processor::ProcessOutcome::Skipped`].
#[derive(Debug, thiserror::Error)]
pub enum ReputeError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Indexer error: {0}")]
    Gateway(#[from] IndexerError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("NATS error: {0}")]
    Nats(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReputeError {
    /// Whether redelivering the same event may succeed.
    ///
    /// Store failures are retryable because the event guard is released when
    /// the activity write fails, and a redelivery after a failed ledger write
    /// is absorbed by the guard.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_retryable(),
            Self::Store(_) => true,
            Self::NotFound(_)
            | Self::InvalidAddress(_)
            | Self::Config(_)
            | Self::BadRequest(_)
            | Self::Nats(_)
            | Self::Internal(_) => false,
        }
    }
}

impl From<mongodb::error::Error> for ReputeError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ReputeError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ReputeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for Repute operations
pub type Result<T> = std::result::Result<T, ReputeError>;
