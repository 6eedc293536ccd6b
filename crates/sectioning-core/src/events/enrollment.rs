//! Student enrollment events.

use serde::{Deserialize, Serialize};

use crate::types::id::{CourseId, OfferingId, RequestId, SectionId, StudentId};
use crate::types::outcome::ResultType;

/// Events describing changes to one student's enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EnrollmentEvent {
    /// A course request's enrollment changed (or a change was attempted).
    Changed {
        /// The student.
        student_id: StudentId,
        /// The course request.
        request_id: RequestId,
        /// The offering that was processed.
        offering_id: OfferingId,
        /// Course of the enrollment before the change.
        old_course: Option<CourseId>,
        /// Sections held before the change.
        old_sections: Vec<SectionId>,
        /// Course of the enrollment after the change.
        new_course: Option<CourseId>,
        /// Sections held after the change.
        new_sections: Vec<SectionId>,
        /// Classification of the outcome.
        result: ResultType,
        /// Failure description, if any.
        failure: Option<String>,
    },
    /// A course was dropped as part of a swap.
    Dropped {
        /// The student.
        student_id: StudentId,
        /// The request whose enrollment was removed.
        request_id: RequestId,
        /// The dropped course.
        course_id: CourseId,
        /// Sections that were released.
        sections: Vec<SectionId>,
    },
}

impl EnrollmentEvent {
    /// The student the event concerns.
    pub fn student_id(&self) -> StudentId {
        match self {
            Self::Changed { student_id, .. } | Self::Dropped { student_id, .. } => *student_id,
        }
    }
}
