//! In-memory store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use sectioning_core::result::AppResult;
use sectioning_core::types::id::{CourseId, OfferingId, SectionId, StudentId};
use sectioning_entity::audit::AuditEntry;
use sectioning_entity::student::{EnrollmentRecord, OfferingEnrollments, Student};

use super::{EnrollmentStore, StudentCommit};

#[derive(Debug, Default)]
struct State {
    students: BTreeMap<StudentId, Student>,
    audit: Vec<AuditEntry>,
    expected_space: HashMap<SectionId, i64>,
}

/// Store keeping everything in process memory.
///
/// Each commit runs under one write guard, so readers never observe a
/// partially applied commit.
#[derive(Debug, Default)]
pub struct MemoryEnrollmentStore {
    state: RwLock<State>,
}

impl MemoryEnrollmentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with students.
    pub fn with_students(students: impl IntoIterator<Item = Student>) -> Self {
        let state = State {
            students: students.into_iter().map(|s| (s.id, s)).collect(),
            ..Default::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Number of stored students.
    pub async fn student_count(&self) -> usize {
        self.state.read().await.students.len()
    }
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn find_student(&self, id: StudentId) -> AppResult<Option<Student>> {
        Ok(self.state.read().await.students.get(&id).cloned())
    }

    async fn students_for_courses(&self, courses: &[CourseId]) -> AppResult<Vec<Student>> {
        let state = self.state.read().await;
        Ok(state
            .students
            .values()
            .filter(|s| {
                s.course_requests()
                    .any(|r| r.courses.iter().any(|c| courses.contains(c)))
            })
            .cloned()
            .collect())
    }

    async fn offering_enrollments(&self, offering: OfferingId) -> AppResult<OfferingEnrollments> {
        let state = self.state.read().await;
        let records = state
            .students
            .values()
            .flat_map(|student| {
                student
                    .enrollments()
                    .filter(|(_, e)| e.offering_id == offering)
                    .map(|(request, enrollment)| EnrollmentRecord {
                        student_id: student.id,
                        request_id: request.id,
                        enrollment: enrollment.clone(),
                    })
            })
            .collect();
        Ok(OfferingEnrollments::new(records))
    }

    async fn save_student(&self, student: Student) -> AppResult<()> {
        self.state.write().await.students.insert(student.id, student);
        Ok(())
    }

    async fn commit(&self, commit: StudentCommit) -> AppResult<()> {
        let mut state = self.state.write().await;
        let student_id = commit.student.id;
        state.students.insert(student_id, commit.student);
        for (section, delta) in commit.expected_space {
            *state.expected_space.entry(section).or_default() += delta;
        }
        let entries = commit.audit.len();
        state.audit.extend(commit.audit);
        debug!(student_id = %student_id, audit_entries = entries, "Committed student change");
        Ok(())
    }

    async fn append_audit(&self, entry: AuditEntry) -> AppResult<()> {
        self.state.write().await.audit.push(entry);
        Ok(())
    }

    async fn audit_log(&self, student: Option<StudentId>) -> AppResult<Vec<AuditEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .filter(|e| student.is_none_or(|id| e.student_id == id))
            .cloned()
            .collect())
    }

    async fn expected_space(&self, section: SectionId) -> AppResult<i64> {
        Ok(self
            .state
            .read()
            .await
            .expected_space
            .get(&section)
            .copied()
            .unwrap_or_default())
    }
}
