//! Persistent store boundary.
//!
//! The engine reads students and enrollments through [`EnrollmentStore`] and
//! writes one [`StudentCommit`] per changed student. A commit is applied
//! entirely or not at all.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;

use sectioning_core::result::AppResult;
use sectioning_core::types::id::{CourseId, OfferingId, SectionId, StudentId};
use sectioning_entity::audit::AuditEntry;
use sectioning_entity::student::{OfferingEnrollments, Student};

pub use memory::MemoryEnrollmentStore;

/// One transactional write for one student.
#[derive(Debug, Clone)]
pub struct StudentCommit {
    /// The student record after the change (requests, enrollments, and
    /// wait-list flags).
    pub student: Student,
    /// Audit entries describing the change.
    pub audit: Vec<AuditEntry>,
    /// Expected-space adjustments per section.
    pub expected_space: BTreeMap<SectionId, i64>,
}

impl StudentCommit {
    /// Creates a commit without audit or statistics.
    pub fn new(student: Student) -> Self {
        Self {
            student,
            audit: Vec::new(),
            expected_space: BTreeMap::new(),
        }
    }

    /// Adds an audit entry.
    pub fn with_audit(mut self, entry: AuditEntry) -> Self {
        self.audit.push(entry);
        self
    }

    /// Adjusts the expected space of the sections by `delta`.
    pub fn adjust_space(&mut self, sections: &[SectionId], delta: i64) {
        for section in sections {
            *self.expected_space.entry(*section).or_default() += delta;
        }
    }
}

/// System of record for students, enrollments, and wait-list history.
#[async_trait]
pub trait EnrollmentStore: Send + Sync + std::fmt::Debug {
    /// Loads a student.
    async fn find_student(&self, id: StudentId) -> AppResult<Option<Student>>;

    /// Students with a request mentioning any of the courses.
    async fn students_for_courses(&self, courses: &[CourseId]) -> AppResult<Vec<Student>>;

    /// Current enrollments of an offering.
    async fn offering_enrollments(&self, offering: OfferingId) -> AppResult<OfferingEnrollments>;

    /// Inserts or replaces a student record without audit.
    async fn save_student(&self, student: Student) -> AppResult<()>;

    /// Applies a commit atomically.
    async fn commit(&self, commit: StudentCommit) -> AppResult<()>;

    /// Appends an audit entry on its own.
    async fn append_audit(&self, entry: AuditEntry) -> AppResult<()>;

    /// Audit entries, optionally for one student, oldest first.
    async fn audit_log(&self, student: Option<StudentId>) -> AppResult<Vec<AuditEntry>>;

    /// Expected-space statistic of a section.
    async fn expected_space(&self, section: SectionId) -> AppResult<i64>;
}
