//! Unified application error types for the sectioning engine.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A course, section, student, or offering id could not be resolved.
    NotFound,
    /// A cancelled section was requested.
    Cancelled,
    /// A new/change/drop deadline has passed.
    DeadlineExceeded,
    /// Capacity or reservation space is exhausted.
    NotAvailable,
    /// The section set does not form a valid enrollment.
    StructureInvalid,
    /// Two sections meet at the same time.
    TimeConflict,
    /// The external enrollment provider rejected or failed a change.
    ProviderFailure,
    /// A lock could not be acquired in time.
    LockTimeout,
    /// The engine is shutting down and refused the operation.
    Shutdown,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (concurrent modification, stale data, etc.).
    Conflict,
    /// The persistent store failed.
    Store,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::DeadlineExceeded => write!(f, "DEADLINE_EXCEEDED"),
            Self::NotAvailable => write!(f, "NOT_AVAILABLE"),
            Self::StructureInvalid => write!(f, "STRUCTURE_INVALID"),
            Self::TimeConflict => write!(f, "TIME_CONFLICT"),
            Self::ProviderFailure => write!(f, "PROVIDER_FAILURE"),
            Self::LockTimeout => write!(f, "LOCK_TIMEOUT"),
            Self::Shutdown => write!(f, "SHUTDOWN"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Store => write!(f, "STORE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl ErrorKind {
    /// Whether an error of this kind aborts the whole operation rather than
    /// a single request or candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Shutdown | Self::LockTimeout)
    }
}

/// The unified application error used throughout the engine.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a cancelled-section error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create a deadline error.
    pub fn deadline(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeadlineExceeded, message)
    }

    /// Create a capacity error.
    pub fn not_available(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAvailable, message)
    }

    /// Create a structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StructureInvalid, message)
    }

    /// Create a time conflict error.
    pub fn time_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimeConflict, message)
    }

    /// Create an enrollment provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderFailure, message)
    }

    /// Create a lock timeout error.
    pub fn lock_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LockTimeout, message)
    }

    /// Create a shutdown error.
    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Shutdown, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error must abort the surrounding operation.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
