//! Validation error codes and collection.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sectioning_core::error::{AppError, ErrorKind};
use sectioning_core::types::id::{CourseId, SectionId};

use crate::quota::CapacityLevel;

/// Per-section error code reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationCode {
    /// A cancelled section was requested.
    #[serde(rename = "UT_CANCEL")]
    Cancel,
    /// A deadline has passed.
    #[serde(rename = "UT_DEADLINE")]
    Deadline,
    /// No space left.
    #[serde(rename = "UT_NOT_AVAILABLE")]
    NotAvailable,
    /// The sections do not form a valid enrollment.
    #[serde(rename = "UT_STRUCTURE")]
    Structure,
    /// Two sections overlap.
    #[serde(rename = "UT_TIME_CNF")]
    TimeConflict,
}

impl ViolationCode {
    /// Stable code string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "UT_CANCEL",
            Self::Deadline => "UT_DEADLINE",
            Self::NotAvailable => "UT_NOT_AVAILABLE",
            Self::Structure => "UT_STRUCTURE",
            Self::TimeConflict => "UT_TIME_CNF",
        }
    }

    /// The error kind the code maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancel => ErrorKind::Cancelled,
            Self::Deadline => ErrorKind::DeadlineExceeded,
            Self::NotAvailable => ErrorKind::NotAvailable,
            Self::Structure => ErrorKind::StructureInvalid,
            Self::TimeConflict => ErrorKind::TimeConflict,
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Error code.
    pub code: ViolationCode,
    /// The course grouping the violation belongs to.
    pub course: CourseId,
    /// The offending section, if any.
    pub section: Option<SectionId>,
    /// The full level, for capacity violations.
    pub level: Option<CapacityLevel>,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        code: ViolationCode,
        course: CourseId,
        section: Option<SectionId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            course,
            section,
            level: None,
            message: message.into(),
        }
    }

    /// Sets the capacity level.
    pub fn at_level(mut self, level: CapacityLevel) -> Self {
        self.level = Some(level);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<Violation> for AppError {
    fn from(v: Violation) -> Self {
        AppError::new(v.code.kind(), v.message)
    }
}

/// Whether validation stops at the first violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Return after the first violation.
    #[default]
    FailFast,
    /// Check every rule and return all violations.
    CollectErrors,
}

/// Validation failure.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A fatal condition (unknown id, shutdown, store failure).
    #[error(transparent)]
    App(#[from] AppError),
    /// One or more rules were violated.
    #[error("{} violation(s), first: {}", .0.len(), first_message(.0))]
    Rejected(Vec<Violation>),
}

fn first_message(violations: &[Violation]) -> String {
    violations
        .first()
        .map(|v| v.to_string())
        .unwrap_or_default()
}

impl ValidationError {
    /// The violations, empty for fatal errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::App(_) => &[],
            Self::Rejected(violations) => violations,
        }
    }

    /// Whether any violation carries the code.
    pub fn has_code(&self, code: ViolationCode) -> bool {
        self.violations().iter().any(|v| v.code == code)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::App(e) => e,
            ValidationError::Rejected(mut violations) => {
                if violations.is_empty() {
                    AppError::validation("validation rejected")
                } else {
                    violations.swap_remove(0).into()
                }
            }
        }
    }
}

/// Collects violations according to the mode.
#[derive(Debug)]
pub(crate) struct ViolationSink {
    mode: ValidationMode,
    violations: Vec<Violation>,
}

impl ViolationSink {
    pub(crate) fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            violations: Vec::new(),
        }
    }

    /// Records a violation; in fail-fast mode returns it as the error.
    pub(crate) fn report(&mut self, violation: Violation) -> Result<(), ValidationError> {
        match self.mode {
            ValidationMode::FailFast => Err(ValidationError::Rejected(vec![violation])),
            ValidationMode::CollectErrors => {
                self.violations.push(violation);
                Ok(())
            }
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Rejected(self.violations))
        }
    }
}
