//! Resectioning candidates and their processing order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use sectioning_core::config::{QueueOrder, WaitListMode};
use sectioning_core::types::id::CourseId;
use sectioning_core::types::outcome::WaitListType;
use sectioning_entity::student::{CourseRequest, Enrollment, Student};

use super::reason::ReschedulingReason;

/// Why a request is a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Not enrolled and waiting for a seat.
    WaitListed,
    /// Enrolled in a lower choice and waiting for a better one.
    Upgrade,
    /// Enrolled, but the enrollment is no longer valid.
    Disrupted(ReschedulingReason),
}

/// One course request to re-section within one offering.
#[derive(Debug, Clone)]
pub struct SectioningRequest {
    /// The student as loaded when the candidate list was built.
    pub student: Student,
    /// The course request.
    pub request: CourseRequest,
    /// Why the request is a candidate.
    pub kind: CandidateKind,
    /// Courses of the triggering offering the search may use, best first.
    pub choices: Vec<CourseId>,
    /// The student's wait-list mode.
    pub mode: WaitListMode,
}

impl SectioningRequest {
    /// The enrollment held before resectioning.
    pub fn last_enrollment(&self) -> Option<&Enrollment> {
        self.request.enrollment.as_ref()
    }

    /// Audit tag of the change.
    pub fn wait_list_type(&self) -> WaitListType {
        match self.kind {
            CandidateKind::Disrupted(_) => WaitListType::ReBatch,
            CandidateKind::WaitListed | CandidateKind::Upgrade => WaitListType::WaitListProcessing,
        }
    }

    /// The rescheduling reason, for disrupted enrollments.
    pub fn reason(&self) -> Option<ReschedulingReason> {
        match self.kind {
            CandidateKind::Disrupted(reason) => Some(reason),
            _ => None,
        }
    }

    fn queued_at(&self) -> DateTime<Utc> {
        self.request.wait_listed_at.unwrap_or(self.request.timestamp)
    }

    /// Processing order under the configured policy.
    pub fn compare(&self, other: &Self, order: QueueOrder) -> Ordering {
        let by_priority = || {
            self.student
                .priority
                .cmp(&other.student.priority)
                .then(self.request.criticality.cmp(&other.request.criticality))
                .then(self.request.alternative.cmp(&other.request.alternative))
                .then(self.request.priority.cmp(&other.request.priority))
        };
        let by_time = || self.queued_at().cmp(&other.queued_at());
        let primary = match order {
            QueueOrder::Priority => by_priority().then_with(by_time),
            QueueOrder::FirstComeFirstServed => by_time().then_with(by_priority),
        };
        primary
            .then(self.student.id.cmp(&other.student.id))
            .then(self.request.id.cmp(&other.request.id))
    }
}

/// Sorts candidates into processing order.
pub fn sort_candidates(candidates: &mut [SectioningRequest], order: QueueOrder) {
    candidates.sort_by(|a, b| a.compare(b, order));
}
