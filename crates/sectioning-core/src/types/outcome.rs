//! Outcome classifications shared by audit records and events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of processing one resectioning candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    /// A new enrollment was committed.
    True,
    /// Nothing changed; the request stays as it was.
    False,
    /// The previous enrollment was removed and the request wait-listed.
    Null,
    /// The change was rejected by a collaborator or failed to commit.
    Failure,
}

impl ResultType {
    /// Return the result as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Null => "NULL",
            Self::Failure => "FAILURE",
        }
    }

    /// Whether the student's schedule changed.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::True | Self::Null)
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit-trail tag describing which process touched a wait-list.
///
/// The engine passes the value through to the store and never derives
/// behavior from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitListType {
    /// Interactive sectioning by the student.
    Sectioning,
    /// Re-batch of a disrupted enrollment.
    ReBatch,
    /// Wait-list processing after capacity opened up.
    WaitListProcessing,
    /// Scheduling assistant or advisor change.
    Scheduling,
    /// Update pushed by an external system.
    ExternalUpdate,
}

impl fmt::Display for WaitListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sectioning => "sectioning",
            Self::ReBatch => "re_batch",
            Self::WaitListProcessing => "wait_list_processing",
            Self::Scheduling => "scheduling",
            Self::ExternalUpdate => "external_update",
        };
        write!(f, "{label}")
    }
}
