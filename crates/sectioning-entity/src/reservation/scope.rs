//! Reservation scoping rules.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{CourseId, StudentId};

use crate::student::Student;

/// Who a reservation is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReservationScope {
    /// Listed students only.
    Individual {
        /// Eligible students.
        students: BTreeSet<StudentId>,
    },
    /// Members of a student group.
    Group {
        /// Group code.
        group: String,
    },
    /// Students requesting one course name of a cross-listed offering.
    Course {
        /// The course.
        course: CourseId,
    },
    /// Any student.
    Unrestricted,
}

impl ReservationScope {
    /// Whether the scope covers the student enrolling through the course.
    pub fn matches(&self, student: &Student, course: CourseId) -> bool {
        match self {
            Self::Individual { students } => students.contains(&student.id),
            Self::Group { group } => student.groups.contains(group),
            Self::Course { course: reserved } => *reserved == course,
            Self::Unrestricted => true,
        }
    }

    /// Ordering rank: narrower scopes are tried first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Individual { .. } => 0,
            Self::Group { .. } => 1,
            Self::Course { .. } => 2,
            Self::Unrestricted => 3,
        }
    }
}
