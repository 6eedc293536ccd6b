//! Audit entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sectioning_core::types::id::{OfferingId, StudentId};
use sectioning_core::types::outcome::{ResultType, WaitListType};

/// One logged enrollment action.
///
/// Written in the same commit as the enrollment change it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier (time-ordered).
    pub id: Uuid,
    /// The affected student.
    pub student_id: StudentId,
    /// The offering that triggered the action, if any.
    pub offering_id: Option<OfferingId>,
    /// Action name (e.g. `resection`, `enroll`).
    pub action: String,
    /// Outcome.
    pub result: ResultType,
    /// Originating wait-list path.
    pub wait_list_type: Option<WaitListType>,
    /// Enrollment summary before the action.
    pub before: Option<String>,
    /// Enrollment summary after the action.
    pub after: Option<String>,
    /// Failure or informational message.
    pub message: Option<String>,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry with a fresh time-ordered id.
    pub fn new(
        student_id: StudentId,
        offering_id: Option<OfferingId>,
        action: impl Into<String>,
        result: ResultType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            student_id,
            offering_id,
            action: action.into(),
            result,
            wait_list_type: None,
            before: None,
            after: None,
            message: None,
            timestamp,
        }
    }

    /// Sets the wait-list path.
    pub fn with_wait_list_type(mut self, kind: Option<WaitListType>) -> Self {
        self.wait_list_type = kind;
        self
    }

    /// Sets the before/after summaries.
    pub fn with_change(mut self, before: Option<String>, after: Option<String>) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
