//! Student entity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{CourseId, OfferingId, RequestId, StudentId};

use super::enrollment::Enrollment;
use super::request::{CourseRequest, Request};

/// Student priority tier, most important first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentPriority {
    /// Students with registration priority (athletes, veterans, ...).
    Priority,
    /// Senior standing.
    Senior,
    /// Junior standing.
    Junior,
    /// Everyone else.
    Normal,
}

impl Default for StudentPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for StudentPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Priority => "priority",
            Self::Senior => "senior",
            Self::Junior => "junior",
            Self::Normal => "normal",
        };
        write!(f, "{label}")
    }
}

/// A student with an ordered list of requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier.
    pub id: StudentId,
    /// External (registrar) identifier.
    pub external_id: String,
    /// Display name.
    pub name: String,
    /// Student status code, mapped to a wait-list mode by configuration.
    #[serde(default)]
    pub status: Option<String>,
    /// Priority tier.
    #[serde(default)]
    pub priority: StudentPriority,
    /// Student groups (used by group reservations).
    #[serde(default)]
    pub groups: BTreeSet<String>,
    /// Requests in priority order.
    #[serde(default)]
    pub requests: Vec<Request>,
}

impl Student {
    /// Iterates over course requests.
    pub fn course_requests(&self) -> impl Iterator<Item = &CourseRequest> {
        self.requests.iter().filter_map(Request::as_course)
    }

    /// Finds a course request by id.
    pub fn course_request(&self, id: RequestId) -> Option<&CourseRequest> {
        self.course_requests().find(|r| r.id == id)
    }

    /// Finds a mutable course request by id.
    pub fn course_request_mut(&mut self, id: RequestId) -> Option<&mut CourseRequest> {
        self.requests
            .iter_mut()
            .filter_map(Request::as_course_mut)
            .find(|r| r.id == id)
    }

    /// Finds the course request listing the course among its choices.
    pub fn request_for_course(&self, course: CourseId) -> Option<&CourseRequest> {
        self.course_requests().find(|r| r.courses.contains(&course))
    }

    /// Finds the course request currently enrolled in the course.
    pub fn request_enrolled_in(&self, course: CourseId) -> Option<&CourseRequest> {
        self.course_requests()
            .find(|r| r.enrollment.as_ref().is_some_and(|e| e.course_id == course))
    }

    /// Iterates over committed enrollments together with their requests.
    pub fn enrollments(&self) -> impl Iterator<Item = (&CourseRequest, &Enrollment)> {
        self.course_requests()
            .filter_map(|r| r.enrollment.as_ref().map(|e| (r, e)))
    }

    /// Offerings the student is enrolled in.
    pub fn enrolled_offerings(&self) -> BTreeSet<OfferingId> {
        self.enrollments().map(|(_, e)| e.offering_id).collect()
    }
}
