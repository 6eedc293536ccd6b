//! Enrollment service.
//!
//! Both operations lock the student together with every offering the
//! candidate touches (the student's current enrollments plus the courses in
//! the assignment), re-reading state once the locks are held.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use sectioning_core::error::AppError;
use sectioning_core::events::enrollment::EnrollmentEvent;
use sectioning_core::events::{DomainEvent, EventPayload};
use sectioning_core::result::AppResult;
use sectioning_core::types::id::{OfferingId, StudentId};
use sectioning_core::types::outcome::{ResultType, WaitListType};
use sectioning_entity::assignment::ClassAssignment;
use sectioning_entity::audit::AuditEntry;
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::student::{Enrollment, OfferingEnrollments, Student};

use crate::context::EngineContext;
use crate::lock::Lock;
use crate::resection::describe;
use crate::store::StudentCommit;
use crate::validator::{
    ValidatedGrouping, ValidationError, ValidationInput, ValidationMode, offerings_touched,
};

const SOURCE: &str = "enroll";

/// Attempts at locking a stable set of offerings before giving up.
const LOCK_ATTEMPTS: usize = 3;

/// Result of a committed enrollment.
#[derive(Debug, Clone)]
pub struct EnrollOutcome {
    /// The student after the commit.
    pub student: Student,
    /// The validated grouping that was committed.
    pub grouping: ValidatedGrouping,
    /// Offerings that lost at least one enrolled section and should be
    /// rechecked.
    pub freed_offerings: Vec<OfferingId>,
}

/// Validates and commits interactive schedule changes.
#[derive(Debug, Clone)]
pub struct EnrollmentService {
    ctx: Arc<EngineContext>,
}

/// State read under the locks.
struct Locked {
    _lock: Lock,
    snapshot: Arc<CatalogSnapshot>,
    student: Student,
    enrollments: HashMap<OfferingId, OfferingEnrollments>,
}

impl EnrollmentService {
    /// Creates the service.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Checks a candidate schedule without changing anything.
    pub async fn validate(
        &self,
        student_id: StudentId,
        assignments: &[ClassAssignment],
        mode: ValidationMode,
    ) -> Result<ValidatedGrouping, ValidationError> {
        let locked = self.lock(student_id, assignments, "validate").await?;
        self.run_validation(&locked, assignments, mode)
    }

    /// Validates the candidate in fail-fast mode and commits it.
    ///
    /// Requests in the grouping receive their new enrollment; enrolled
    /// courses left out of the candidate are dropped.
    pub async fn enroll(
        &self,
        student_id: StudentId,
        assignments: &[ClassAssignment],
    ) -> Result<EnrollOutcome, ValidationError> {
        let locked = self.lock(student_id, assignments, SOURCE).await?;
        let grouping = self.run_validation(&locked, assignments, ValidationMode::FailFast)?;
        let now = self.ctx.clock.now();
        let (commit, changes, freed) = apply(&locked.snapshot, &locked.student, &grouping, now)?;
        let student = commit.student.clone();
        self.ctx.store.commit(commit).await?;
        drop(locked);

        info!(
            student_id = %student_id,
            courses = grouping.requests.len(),
            dropped = grouping.dropped.len(),
            "Enrollment committed"
        );
        for change in changes {
            self.ctx
                .notifier
                .notify(DomainEvent::new(SOURCE, now, EventPayload::Enrollment(change)))
                .await;
        }
        Ok(EnrollOutcome {
            student,
            grouping,
            freed_offerings: freed.into_iter().collect(),
        })
    }

    fn run_validation(
        &self,
        locked: &Locked,
        assignments: &[ClassAssignment],
        mode: ValidationMode,
    ) -> Result<ValidatedGrouping, ValidationError> {
        let result = self.ctx.validator.validate(ValidationInput {
            snapshot: &locked.snapshot,
            student: &locked.student,
            assignments,
            enrollments: &locked.enrollments,
            now: self.ctx.clock.now(),
            mode,
        });
        if let Err(ValidationError::Rejected(violations)) = &result {
            debug!(
                student_id = %locked.student.id,
                violations = violations.len(),
                "Candidate schedule rejected"
            );
        }
        result
    }

    /// Locks the student and the touched offerings, retrying when the
    /// student's enrollments moved to another offering in the meantime.
    async fn lock(
        &self,
        student_id: StudentId,
        assignments: &[ClassAssignment],
        reason: &str,
    ) -> AppResult<Locked> {
        let ctx = &self.ctx;
        let mut touched = {
            let snapshot = ctx.catalog.current().await;
            let student = self.load_student(student_id).await?;
            offerings_touched(&snapshot, &student, assignments)
        };
        for _ in 0..LOCK_ATTEMPTS {
            let lock = ctx.locks.lock_student(student_id, &touched, reason).await?;
            let snapshot = ctx.catalog.current().await;
            let student = self.load_student(student_id).await?;
            let needed = offerings_touched(&snapshot, &student, assignments);
            let held: BTreeSet<_> = lock.offerings().iter().copied().collect();
            if needed.iter().all(|id| held.contains(id)) {
                let mut enrollments = HashMap::with_capacity(needed.len());
                for id in needed {
                    enrollments.insert(id, ctx.store.offering_enrollments(id).await?);
                }
                return Ok(Locked {
                    _lock: lock,
                    snapshot,
                    student,
                    enrollments,
                });
            }
            warn!(student_id = %student_id, "Touched offerings changed while locking, retrying");
            touched = needed;
        }
        Err(AppError::conflict(format!(
            "student {student_id} kept changing while acquiring locks"
        )))
    }

    async fn load_student(&self, student_id: StudentId) -> AppResult<Student> {
        self.ctx
            .store
            .find_student(student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {student_id} not found")))
    }
}

/// Builds the commit for a validated grouping together with the events to
/// publish and the offerings that lost enrollments.
fn apply(
    snapshot: &CatalogSnapshot,
    student: &Student,
    grouping: &ValidatedGrouping,
    now: DateTime<Utc>,
) -> AppResult<(StudentCommit, Vec<EnrollmentEvent>, BTreeSet<OfferingId>)> {
    let mut student = student.clone();
    let mut audit = Vec::new();
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut events = Vec::new();
    let mut freed = BTreeSet::new();

    for validated in &grouping.requests {
        let request = student
            .course_request_mut(validated.request_id)
            .ok_or_else(|| AppError::not_found(format!("request {} not found", validated.request_id)))?;
        let previous = request.enrollment.take();
        let enrollment = match previous.as_ref() {
            Some(prev)
                if prev.course_id == validated.course_id
                    && prev.sections.len() == validated.sections.len()
                    && validated.sections.iter().all(|s| prev.contains(*s)) =>
            {
                prev.clone()
            }
            _ => Enrollment {
                offering_id: validated.offering_id,
                course_id: validated.course_id,
                config_id: validated.config_id,
                sections: validated.sections.clone(),
                reservation_id: validated.reservation_id,
                approval: None,
                timestamp: now,
            },
        };
        if request.choice_index(enrollment.course_id) == Some(0) {
            request.wait_list = false;
            request.wait_listed_at = None;
        }
        request.enrollment = Some(enrollment.clone());

        if previous.as_ref().is_some_and(|p| p.same_sections(&enrollment)) {
            continue;
        }
        added.extend(
            enrollment
                .sections
                .iter()
                .copied()
                .filter(|s| !previous.as_ref().is_some_and(|p| p.contains(*s))),
        );
        if let Some(prev) = &previous {
            let lost: Vec<_> = prev
                .sections
                .iter()
                .copied()
                .filter(|s| !enrollment.contains(*s))
                .collect();
            if !lost.is_empty() {
                freed.insert(prev.offering_id);
            }
            removed.extend(lost);
        }
        audit.push(
            AuditEntry::new(student.id, Some(enrollment.offering_id), "enroll", ResultType::True, now)
                .with_wait_list_type(Some(WaitListType::Sectioning))
                .with_change(
                    previous.as_ref().map(|e| describe(snapshot, e)),
                    Some(describe(snapshot, &enrollment)),
                ),
        );
        events.push(EnrollmentEvent::Changed {
            student_id: student.id,
            request_id: validated.request_id,
            offering_id: enrollment.offering_id,
            old_course: previous.as_ref().map(|e| e.course_id),
            old_sections: previous.map(|e| e.sections).unwrap_or_default(),
            new_course: Some(enrollment.course_id),
            new_sections: enrollment.sections,
            result: ResultType::True,
            failure: None,
        });
    }

    for dropped in &grouping.dropped {
        let request = student
            .course_request_mut(dropped.request_id)
            .ok_or_else(|| AppError::not_found(format!("request {} not found", dropped.request_id)))?;
        let Some(previous) = request.enrollment.take() else {
            continue;
        };
        freed.insert(previous.offering_id);
        removed.extend(previous.sections.iter().copied());
        audit.push(
            AuditEntry::new(student.id, Some(previous.offering_id), "drop", ResultType::True, now)
                .with_wait_list_type(Some(WaitListType::Sectioning))
                .with_change(Some(describe(snapshot, &previous)), None),
        );
        events.push(EnrollmentEvent::Dropped {
            student_id: student.id,
            request_id: dropped.request_id,
            course_id: previous.course_id,
            sections: previous.sections,
        });
    }

    let mut commit = StudentCommit::new(student);
    commit.adjust_space(&added, 1);
    commit.adjust_space(&removed, -1);
    commit.audit = audit;
    Ok((commit, events, freed))
}
