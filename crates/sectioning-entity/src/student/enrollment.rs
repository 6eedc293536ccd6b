//! Committed enrollments and per-offering enrollment views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{
    ConfigId, CourseId, OfferingId, RequestId, ReservationId, SectionId, StudentId,
};

/// Approval metadata of an enrollment requiring consent or an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Who approved.
    pub approved_by: String,
    /// When.
    pub approved_at: DateTime<Utc>,
}

/// A committed class assignment of one course request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Offering of the course.
    pub offering_id: OfferingId,
    /// Enrolled course.
    pub course_id: CourseId,
    /// Enrolled configuration.
    pub config_id: ConfigId,
    /// One section per subpart of the configuration.
    pub sections: Vec<SectionId>,
    /// Reservation the enrollment is attributed to.
    #[serde(default)]
    pub reservation_id: Option<ReservationId>,
    /// Approval metadata.
    #[serde(default)]
    pub approval: Option<Approval>,
    /// When the enrollment was made.
    pub timestamp: DateTime<Utc>,
}

impl Enrollment {
    /// Whether the enrollment includes the section.
    pub fn contains(&self, section: SectionId) -> bool {
        self.sections.contains(&section)
    }

    /// Whether both enrollments hold the same course and sections.
    pub fn same_sections(&self, other: &Enrollment) -> bool {
        self.course_id == other.course_id
            && self.sections.len() == other.sections.len()
            && self.sections.iter().all(|s| other.contains(*s))
    }
}

/// One student's enrollment in an offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// The student.
    pub student_id: StudentId,
    /// The course request.
    pub request_id: RequestId,
    /// The enrollment.
    pub enrollment: Enrollment,
}

/// All current enrollments of one offering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferingEnrollments {
    /// Enrollment records.
    pub records: Vec<EnrollmentRecord>,
}

impl OfferingEnrollments {
    /// Creates the view from records.
    pub fn new(records: Vec<EnrollmentRecord>) -> Self {
        Self { records }
    }

    /// Number of students in the section.
    pub fn count_section(&self, section: SectionId) -> usize {
        self.records
            .iter()
            .filter(|r| r.enrollment.contains(section))
            .count()
    }

    /// Number of students in the configuration.
    pub fn count_config(&self, config: ConfigId) -> usize {
        self.records
            .iter()
            .filter(|r| r.enrollment.config_id == config)
            .count()
    }

    /// Number of students in the course.
    pub fn count_course(&self, course: CourseId) -> usize {
        self.records
            .iter()
            .filter(|r| r.enrollment.course_id == course)
            .count()
    }

    /// Number of enrollments attributed to the reservation.
    pub fn count_reservation(&self, reservation: ReservationId) -> usize {
        self.records
            .iter()
            .filter(|r| r.enrollment.reservation_id == Some(reservation))
            .count()
    }

    /// The student's enrollment in this offering, if any.
    pub fn of_student(&self, student: StudentId) -> Option<&EnrollmentRecord> {
        self.records.iter().find(|r| r.student_id == student)
    }
}
