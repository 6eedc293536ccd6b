//! Offering and course entities.

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{ConfigId, CourseId, OfferingId, ReservationId, SectionId};

use super::distribution::Distribution;

/// Root aggregate of the catalog: one offering with its course names,
/// configurations, reservations, and distribution constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offering {
    /// Unique offering identifier.
    pub id: OfferingId,
    /// Display name (usually the controlling course name).
    pub name: String,
    /// The controlling course.
    pub controlling_course_id: CourseId,
    /// All course names of the offering (cross-lists included).
    pub courses: Vec<CourseId>,
    /// Instructional configurations.
    pub configs: Vec<ConfigId>,
    /// Reservations.
    #[serde(default)]
    pub reservations: Vec<ReservationId>,
    /// Distribution constraints.
    #[serde(default)]
    pub distributions: Vec<Distribution>,
    /// Whether wait-listing is enabled.
    #[serde(default)]
    pub wait_list: bool,
    /// Whether disrupted enrollments are re-scheduled automatically.
    #[serde(default)]
    pub reschedule: bool,
}

impl Offering {
    /// Whether the two sections may overlap due to a distribution exception.
    pub fn allows_overlap(&self, a: SectionId, b: SectionId) -> bool {
        self.distributions.iter().any(|d| d.allows_overlap(a, b))
    }

    /// Whether the course is one of this offering's names.
    pub fn has_course(&self, course: CourseId) -> bool {
        self.courses.contains(&course)
    }
}

/// A named, possibly cross-listed view of an offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier.
    pub id: CourseId,
    /// The owning offering.
    pub offering_id: OfferingId,
    /// Subject area abbreviation.
    pub subject: String,
    /// Course number.
    pub number: String,
    /// Enrollment limit of this course name, `-1` for unlimited.
    pub limit: i32,
    /// Consent requirement (e.g. `IN` for instructor), if any.
    #[serde(default)]
    pub consent: Option<String>,
}

impl Course {
    /// Display name of the course.
    pub fn name(&self) -> String {
        format!("{} {}", self.subject, self.number)
    }
}
