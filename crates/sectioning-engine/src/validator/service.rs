//! The validation pipeline.
//!
//! Rules run in a fixed order over the course groupings of the candidate:
//! id resolution, cancelled sections, deadlines, capacity, structure, and
//! cross-course conflicts. The validator only reads; callers hold the
//! student and offering locks.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sectioning_core::config::PolicyConfig;
use sectioning_core::error::AppError;
use sectioning_core::types::id::{
    ConfigId, CourseId, OfferingId, RequestId, ReservationId, SectionId, StudentId,
};
use sectioning_entity::assignment::ClassAssignment;
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::offering::{Course, InstrConfig, Offering, Section};
use sectioning_entity::student::{CourseRequest, Enrollment, OfferingEnrollments, Student};

use super::structure::inspect;
use super::violation::{ValidationError, ValidationMode, Violation, ViolationCode, ViolationSink};
use crate::deadline::{DeadlineChecker, DeadlineKind};
use crate::quota::Quota;

/// A validated enrollment for one course request, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// The course request receiving the enrollment.
    pub request_id: RequestId,
    /// Offering of the course.
    pub offering_id: OfferingId,
    /// The course.
    pub course_id: CourseId,
    /// The configuration of the sections.
    pub config_id: ConfigId,
    /// Sections, in the order given.
    pub sections: Vec<SectionId>,
    /// Reservation the enrollment is attributed to.
    pub reservation_id: Option<ReservationId>,
}

/// A course the student is enrolled in but left out of the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedCourse {
    /// The request losing its enrollment.
    pub request_id: RequestId,
    /// Offering of the course.
    pub offering_id: OfferingId,
    /// The dropped course.
    pub course_id: CourseId,
}

/// Successful validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedGrouping {
    /// The student.
    pub student_id: StudentId,
    /// One entry per course grouping.
    pub requests: Vec<EnrollmentRequest>,
    /// Enrolled courses missing from the candidate.
    pub dropped: Vec<DroppedCourse>,
}

/// Everything a validation run reads.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    /// Catalog snapshot.
    pub snapshot: &'a CatalogSnapshot,
    /// The student with current requests and enrollments.
    pub student: &'a Student,
    /// Candidate assignments; free-time entries are skipped.
    pub assignments: &'a [ClassAssignment],
    /// Current enrollments of every offering the candidate touches.
    pub enrollments: &'a HashMap<OfferingId, OfferingEnrollments>,
    /// Request time.
    pub now: DateTime<Utc>,
    /// Error handling mode.
    pub mode: ValidationMode,
}

struct Grouping<'a> {
    course: &'a Course,
    offering: &'a Offering,
    request: &'a CourseRequest,
    config: &'a InstrConfig,
    sections: Vec<&'a Section>,
    prior: Option<&'a Enrollment>,
    reservation: Option<ReservationId>,
    reservation_overlap: bool,
}

impl Grouping<'_> {
    fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id).collect()
    }

    fn allows_overlap(&self) -> bool {
        self.config.allow_overlap || self.reservation_overlap || self.request.overrides.time_conflict
    }
}

/// Checks candidate class assignments for one student.
#[derive(Debug, Clone)]
pub struct EnrollmentValidator {
    policy: PolicyConfig,
    deadlines: DeadlineChecker,
}

impl EnrollmentValidator {
    /// Creates a validator.
    pub fn new(policy: PolicyConfig, deadlines: DeadlineChecker) -> Self {
        Self { policy, deadlines }
    }

    /// Validates the candidate.
    ///
    /// Unknown ids are fatal in both modes. In fail-fast mode the first rule
    /// violation is returned on its own; otherwise all are collected.
    pub fn validate(&self, input: ValidationInput<'_>) -> Result<ValidatedGrouping, ValidationError> {
        let mut sink = ViolationSink::new(input.mode);
        let student = input.student;
        let mut groups = resolve(input)?;

        let mut used_requests = BTreeSet::new();
        for g in &groups {
            if !used_requests.insert(g.request.id) {
                sink.report(Violation::new(
                    ViolationCode::Structure,
                    g.course.id,
                    None,
                    format!(
                        "{} is an alternative of a course already in the selection",
                        g.course.name()
                    ),
                ))?;
            }
        }

        for g in &groups {
            for section in &g.sections {
                if !section.cancelled {
                    continue;
                }
                let grandfathered = g.prior.is_some_and(|e| e.contains(section.id));
                if !(grandfathered && self.policy.allow_keep_cancelled) {
                    sink.report(Violation::new(
                        ViolationCode::Cancel,
                        g.course.id,
                        Some(section.id),
                        format!("{} {} has been cancelled", g.course.name(), section.name),
                    ))?;
                }
            }
        }

        for g in &groups {
            for section in &g.sections {
                let kind = match g.prior {
                    Some(prior) if prior.contains(section.id) => continue,
                    Some(_) => DeadlineKind::Change,
                    None => DeadlineKind::New,
                };
                if !self
                    .deadlines
                    .check_deadline(g.offering.id, Some(section), input.now, kind)
                {
                    sink.report(Violation::new(
                        ViolationCode::Deadline,
                        g.course.id,
                        Some(section.id),
                        format!(
                            "{} {}: the {kind} deadline has passed",
                            g.course.name(),
                            section.name
                        ),
                    ))?;
                }
            }
        }
        let dropped = dropped_courses(student, &groups);
        for drop in &dropped {
            let Some((_, enrollment)) = student
                .enrollments()
                .find(|(r, _)| r.id == drop.request_id)
            else {
                continue;
            };
            for id in &enrollment.sections {
                let section = input.snapshot.section(*id);
                if !self
                    .deadlines
                    .check_deadline(drop.offering_id, section, input.now, DeadlineKind::Drop)
                {
                    sink.report(Violation::new(
                        ViolationCode::Deadline,
                        drop.course_id,
                        Some(*id),
                        format!("section {id}: the drop deadline has passed"),
                    ))?;
                }
            }
        }

        let empty = OfferingEnrollments::default();
        for g in groups.iter_mut() {
            let view = input.enrollments.get(&g.offering.id).unwrap_or(&empty);
            let quota = Quota::new(input.snapshot, g.offering, view, input.now);
            let check = quota.check_capacity(
                student,
                g.request.overrides,
                g.course.id,
                g.config,
                &g.section_ids(),
            );
            g.reservation = check.reservation;
            g.reservation_overlap = check.allow_overlap;
            for shortfall in check.shortfalls {
                let message = match shortfall.level {
                    crate::quota::CapacityLevel::Section => format!(
                        "{} {} is not available",
                        g.course.name(),
                        shortfall
                            .section
                            .and_then(|id| input.snapshot.section(id))
                            .map_or("", |s| s.name.as_str())
                    ),
                    level => format!("{} is not available ({level} limit)", g.course.name()),
                };
                sink.report(
                    Violation::new(
                        ViolationCode::NotAvailable,
                        g.course.id,
                        shortfall.section,
                        message,
                    )
                    .at_level(shortfall.level),
                )?;
            }
        }

        for g in &groups {
            for issue in inspect(input.snapshot, g.offering, &g.section_ids()) {
                let code = if issue.is_overlap() {
                    ViolationCode::TimeConflict
                } else {
                    ViolationCode::Structure
                };
                sink.report(Violation::new(
                    code,
                    g.course.id,
                    issue.section(),
                    format!("{}: {issue}", g.course.name()),
                ))?;
            }
        }

        for (i, first) in groups.iter().enumerate() {
            for second in &groups[i + 1..] {
                if first.allows_overlap() || second.allows_overlap() {
                    continue;
                }
                for a in &first.sections {
                    for b in &second.sections {
                        if a.overlaps(b) {
                            sink.report(Violation::new(
                                ViolationCode::TimeConflict,
                                second.course.id,
                                Some(b.id),
                                format!(
                                    "{} {} conflicts with {} {}",
                                    second.course.name(),
                                    b.name,
                                    first.course.name(),
                                    a.name
                                ),
                            ))?;
                        }
                    }
                }
            }
        }

        sink.finish()?;

        Ok(ValidatedGrouping {
            student_id: student.id,
            requests: groups
                .iter()
                .map(|g| EnrollmentRequest {
                    request_id: g.request.id,
                    offering_id: g.offering.id,
                    course_id: g.course.id,
                    config_id: g.config.id,
                    sections: g.section_ids(),
                    reservation_id: g.reservation,
                })
                .collect(),
            dropped,
        })
    }
}

/// Offerings a candidate touches: those of the assigned courses and of the
/// student's current enrollments.
pub fn offerings_touched(
    snapshot: &CatalogSnapshot,
    student: &Student,
    assignments: &[ClassAssignment],
) -> Vec<OfferingId> {
    let mut ids: BTreeSet<OfferingId> = student.enrolled_offerings();
    for assignment in assignments {
        if let ClassAssignment::Section { course_id, .. } = assignment {
            if let Some(course) = snapshot.course(*course_id) {
                ids.insert(course.offering_id);
            }
        }
    }
    ids.into_iter().collect()
}

fn resolve<'a>(input: ValidationInput<'a>) -> Result<Vec<Grouping<'a>>, ValidationError> {
    let mut order: Vec<CourseId> = Vec::new();
    let mut by_course: HashMap<CourseId, Vec<SectionId>> = HashMap::new();
    for assignment in input.assignments {
        if let ClassAssignment::Section {
            course_id,
            section_id,
            ..
        } = assignment
        {
            let sections = by_course.entry(*course_id).or_insert_with(|| {
                order.push(*course_id);
                Vec::new()
            });
            if !sections.contains(section_id) {
                sections.push(*section_id);
            }
        }
    }

    let mut groups = Vec::with_capacity(order.len());
    for course_id in order {
        let course = input
            .snapshot
            .course(course_id)
            .ok_or_else(|| AppError::not_found(format!("course {course_id} not found")))?;
        let offering = input
            .snapshot
            .offering(course.offering_id)
            .ok_or_else(|| AppError::not_found(format!("offering {} not found", course.offering_id)))?;
        let request = input
            .student
            .request_enrolled_in(course_id)
            .or_else(|| input.student.request_for_course(course_id))
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "student {} has no request for {}",
                    input.student.id,
                    course.name()
                ))
            })?;
        let mut sections = Vec::new();
        for id in by_course.remove(&course_id).unwrap_or_default() {
            let section = input
                .snapshot
                .section(id)
                .filter(|_| {
                    input
                        .snapshot
                        .offering_of_section(id)
                        .is_some_and(|o| o.id == offering.id)
                })
                .ok_or_else(|| {
                    AppError::not_found(format!("section {id} not found in {}", course.name()))
                })?;
            sections.push(section);
        }
        let config = sections
            .first()
            .and_then(|s| input.snapshot.config_of_section(s.id))
            .ok_or_else(|| AppError::not_found(format!("no configuration for {}", course.name())))?;
        let prior = request
            .enrollment
            .as_ref()
            .filter(|e| e.course_id == course_id);
        groups.push(Grouping {
            course,
            offering,
            request,
            config,
            sections,
            prior,
            reservation: None,
            reservation_overlap: false,
        });
    }
    Ok(groups)
}

fn dropped_courses(student: &Student, groups: &[Grouping<'_>]) -> Vec<DroppedCourse> {
    student
        .enrollments()
        .filter(|(request, enrollment)| {
            !groups
                .iter()
                .any(|g| g.request.id == request.id || g.course.id == enrollment.course_id)
        })
        .map(|(request, enrollment)| DroppedCourse {
            request_id: request.id,
            offering_id: enrollment.offering_id,
            course_id: enrollment.course_id,
        })
        .collect()
}
