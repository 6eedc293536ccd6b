//! Course and free-time requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sectioning_core::config::WaitListMode;
use sectioning_core::types::id::{CourseId, RequestId};

use super::enrollment::Enrollment;
use crate::offering::TimeLocation;

/// Request priority tier, most important first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    /// Critical for degree progress.
    Critical,
    /// Important.
    Important,
    /// Vital.
    Vital,
    /// Learning community.
    Lc,
    /// Regular request.
    Normal,
}

impl Default for RequestPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Overrides granted on a course request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOverrides {
    /// Capacity override: limits do not apply.
    #[serde(default)]
    pub capacity: bool,
    /// Time conflict override: conflicts with other courses are allowed.
    #[serde(default)]
    pub time_conflict: bool,
}

/// A student request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request for one of several alternative courses.
    Course(CourseRequest),
    /// Time the student wants to keep free.
    FreeTime(FreeTimeRequest),
}

impl Request {
    /// Returns the course request, if this is one.
    pub fn as_course(&self) -> Option<&CourseRequest> {
        match self {
            Self::Course(request) => Some(request),
            Self::FreeTime(_) => None,
        }
    }

    /// Returns the mutable course request, if this is one.
    pub fn as_course_mut(&mut self) -> Option<&mut CourseRequest> {
        match self {
            Self::Course(request) => Some(request),
            Self::FreeTime(_) => None,
        }
    }
}

/// Ordered list of alternative courses plus the current enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// Position in the student's request list (lower is more important).
    pub priority: u32,
    /// Whether this is an alternate request.
    #[serde(default)]
    pub alternative: bool,
    /// Alternative courses, first choice first.
    pub courses: Vec<CourseId>,
    /// The student waits for a seat in a better choice.
    #[serde(default)]
    pub wait_list: bool,
    /// The student accepts no substitutes for the listed courses.
    #[serde(default)]
    pub no_sub: bool,
    /// Priority tier.
    #[serde(default)]
    pub criticality: RequestPriority,
    /// Granted overrides.
    #[serde(default)]
    pub overrides: RequestOverrides,
    /// Current committed enrollment.
    #[serde(default)]
    pub enrollment: Option<Enrollment>,
    /// When the request was made.
    pub timestamp: DateTime<Utc>,
    /// When the request was put on the wait-list.
    #[serde(default)]
    pub wait_listed_at: Option<DateTime<Utc>>,
    /// Course to drop when a wait-listed course is enrolled.
    #[serde(default)]
    pub swap_with: Option<CourseId>,
}

impl CourseRequest {
    /// Whether the request waits for a seat under the given mode.
    pub fn is_wait_listed(&self, mode: WaitListMode) -> bool {
        match mode {
            WaitListMode::WaitList => self.wait_list,
            WaitListMode::NoSubs => self.no_sub,
            WaitListMode::None => false,
        }
    }

    /// Position of the course among the alternatives.
    pub fn choice_index(&self, course: CourseId) -> Option<usize> {
        self.courses.iter().position(|c| *c == course)
    }

    /// The currently enrolled course, if any.
    pub fn enrolled_course(&self) -> Option<CourseId> {
        self.enrollment.as_ref().map(|e| e.course_id)
    }

    /// Courses preferred over the currently enrolled one (all when unenrolled).
    pub fn better_choices(&self) -> &[CourseId] {
        match self
            .enrolled_course()
            .and_then(|course| self.choice_index(course))
        {
            Some(index) => &self.courses[..index],
            None => &self.courses,
        }
    }
}

/// Time the student wants to keep free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeTimeRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// Position in the student's request list.
    pub priority: u32,
    /// The free time.
    pub time: TimeLocation,
}
