//! Unified view of what occupies a student's time.

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{CourseId, RequestId, SectionId};

use crate::offering::TimeLocation;

/// A time block assigned to a student: a class or a free-time request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassAssignment {
    /// An enrolled section.
    Section {
        /// The course the section is taken under.
        course_id: CourseId,
        /// The section.
        section_id: SectionId,
        /// Meeting time, if any.
        time: Option<TimeLocation>,
    },
    /// A free-time block.
    FreeTime {
        /// The free-time request.
        request_id: RequestId,
        /// The blocked time.
        time: TimeLocation,
    },
}

impl ClassAssignment {
    /// Meeting time of the assignment.
    pub fn time(&self) -> Option<&TimeLocation> {
        match self {
            Self::Section { time, .. } => time.as_ref(),
            Self::FreeTime { time, .. } => Some(time),
        }
    }

    /// Whether the two assignments overlap in time.
    pub fn overlaps(&self, other: &ClassAssignment) -> bool {
        match (self.time(), other.time()) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => false,
        }
    }
}
