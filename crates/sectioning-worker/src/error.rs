//! Errors of a background recheck.

use sectioning_core::error::{AppError, ErrorKind};

/// Error from one recheck batch.
#[derive(Debug, thiserror::Error)]
pub enum RecheckError {
    /// Permanent failure, the offering is not retried
    #[error("Permanent recheck failure: {0}")]
    Permanent(String),

    /// Transient failure, the offering goes back on the queue
    #[error("Transient recheck failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl RecheckError {
    /// Classifies an engine error.
    pub fn classify(error: AppError) -> Self {
        match error.kind {
            ErrorKind::LockTimeout | ErrorKind::Conflict => Self::Transient(error.to_string()),
            ErrorKind::NotFound => Self::Permanent(error.to_string()),
            _ => Self::Internal(error),
        }
    }

    /// Whether the batch should be queued again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether the worker is shutting down.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Internal(e) if e.kind == ErrorKind::Shutdown)
    }
}
