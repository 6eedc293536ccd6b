//! Resectioning service ("check-offering").
//!
//! Offerings are processed from a worklist. Each offering is handled under
//! its own lock: candidates are collected, ordered, searched one at a time,
//! confirmed with the enrollment provider, and committed under the student
//! lock. Swap drops queue the dropped course's offering; students handled
//! once are skipped for the rest of the pass, so the worklist drains.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use sectioning_core::error::AppError;
use sectioning_core::events::{DomainEvent, EventPayload};
use sectioning_core::events::enrollment::EnrollmentEvent;
use sectioning_core::events::offering::OfferingEvent;
use sectioning_core::result::AppResult;
use sectioning_core::types::id::{CourseId, OfferingId, RequestId, StudentId};
use sectioning_core::types::outcome::ResultType;
use sectioning_entity::audit::AuditEntry;
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::offering::Offering;
use sectioning_entity::student::{Enrollment, Student};

use super::reason::{ReschedulingReason, check};
use super::request::{CandidateKind, SectioningRequest, sort_candidates};
use super::search::{SearchContext, best_enrollment};
use crate::context::EngineContext;
use crate::lock::Lock;
use crate::store::StudentCommit;

const SOURCE: &str = "check-offering";

/// Outcome of one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateOutcome {
    /// The student.
    pub student_id: StudentId,
    /// The course request.
    pub request_id: RequestId,
    /// The offering being processed.
    pub offering_id: OfferingId,
    /// Classification.
    pub result: ResultType,
    /// Rescheduling reason of a disrupted enrollment.
    pub reason: Option<ReschedulingReason>,
    /// Details.
    pub message: Option<String>,
}

/// Summary of one recheck pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecheckReport {
    /// Offerings processed, in order (including cascaded ones).
    pub processed: Vec<OfferingId>,
    /// Offerings skipped because they are unknown or not wait-listed.
    pub skipped: Vec<OfferingId>,
    /// Offerings skipped because another operation held their lock.
    pub busy: Vec<OfferingId>,
    /// Candidate outcomes in processing order.
    pub outcomes: Vec<CandidateOutcome>,
}

impl RecheckReport {
    /// Number of committed changes.
    pub fn changed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_change()).count()
    }

    /// Number of failed candidates.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result == ResultType::Failure)
            .count()
    }

    /// Outcomes of one student.
    pub fn for_student(&self, student: StudentId) -> Vec<&CandidateOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.student_id == student)
            .collect()
    }
}

/// Re-sections wait-listed and disrupted students.
#[derive(Debug, Clone)]
pub struct ResectioningService {
    ctx: Arc<EngineContext>,
}

impl ResectioningService {
    /// Creates the service.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Rechecks the offerings and every offering a swap drop frees up.
    ///
    /// Students in `skip` are never touched; when `only` is given, nobody
    /// else is. Per-candidate failures are reported in the result; only
    /// fatal errors (shutdown) abort the pass.
    pub async fn recheck_offerings(
        &self,
        offerings: &[OfferingId],
        skip: &BTreeSet<StudentId>,
        only: Option<&BTreeSet<StudentId>>,
    ) -> AppResult<RecheckReport> {
        let mut queue: BTreeSet<OfferingId> = offerings.iter().copied().collect();
        let mut handled = skip.clone();
        let mut report = RecheckReport::default();

        while let Some(offering_id) = queue.pop_first() {
            self.process_offering(offering_id, &mut handled, only, &mut queue, &mut report)
                .await?;
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            busy = report.busy.len(),
            changed = report.changed(),
            failed = report.failed(),
            "Recheck pass finished"
        );
        Ok(report)
    }

    async fn process_offering(
        &self,
        offering_id: OfferingId,
        handled: &mut BTreeSet<StudentId>,
        only: Option<&BTreeSet<StudentId>>,
        queue: &mut BTreeSet<OfferingId>,
        report: &mut RecheckReport,
    ) -> AppResult<()> {
        let ctx = &self.ctx;
        let Some(lock) = ctx.locks.try_lock_offering(offering_id, SOURCE).await? else {
            debug!(offering_id = %offering_id, "Offering is locked, skipping");
            report.busy.push(offering_id);
            return Ok(());
        };
        let snapshot = ctx.catalog.current().await;
        let Some(offering) = snapshot.offering(offering_id) else {
            warn!(offering_id = %offering_id, "Offering not in catalog, skipping");
            report.skipped.push(offering_id);
            return Ok(());
        };
        if !offering.wait_list {
            debug!(offering_id = %offering_id, "Wait-listing disabled, skipping");
            report.skipped.push(offering_id);
            return Ok(());
        }

        let students = ctx.store.students_for_courses(&offering.courses).await?;
        let mut candidates = self.collect_candidates(&snapshot, offering, students, handled, only);
        sort_candidates(&mut candidates, ctx.config.search.queue_order);
        debug!(
            offering_id = %offering_id,
            candidates = candidates.len(),
            "Processing offering"
        );

        let mut changed = 0;
        let mut failed = 0;
        let count = candidates.len();
        for candidate in &candidates {
            let outcome = match self
                .process_candidate(&lock, &snapshot, offering, candidate, queue)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(
                        student_id = %candidate.student.id,
                        offering_id = %offering_id,
                        error = %e,
                        "Resectioning candidate failed"
                    );
                    self.outcome(candidate, offering_id, ResultType::Failure, Some(e.to_string()))
                }
            };
            match outcome.result {
                ResultType::True | ResultType::Null => changed += 1,
                ResultType::Failure => failed += 1,
                ResultType::False => {}
            }
            info!(
                student_id = %outcome.student_id,
                request_id = %outcome.request_id,
                offering_id = %offering_id,
                result = %outcome.result,
                "Candidate processed"
            );
            report.outcomes.push(outcome);
        }
        handled.extend(candidates.iter().map(|c| c.student.id));
        report.processed.push(offering_id);
        drop(lock);

        ctx.notifier
            .notify(DomainEvent::new(
                SOURCE,
                ctx.clock.now(),
                EventPayload::Offering(OfferingEvent::Rechecked {
                    offering_id,
                    candidates: count,
                    changed,
                    failed,
                }),
            ))
            .await;
        Ok(())
    }

    fn collect_candidates(
        &self,
        snapshot: &CatalogSnapshot,
        offering: &Offering,
        students: Vec<Student>,
        handled: &BTreeSet<StudentId>,
        only: Option<&BTreeSet<StudentId>>,
    ) -> Vec<SectioningRequest> {
        let config = &self.ctx.config;
        let in_offering = |courses: &[CourseId]| -> Vec<CourseId> {
            courses
                .iter()
                .filter(|c| offering.has_course(**c))
                .copied()
                .collect()
        };
        let mut candidates = Vec::new();
        for student in students {
            if handled.contains(&student.id) || only.is_some_and(|o| !o.contains(&student.id)) {
                continue;
            }
            let mode = config.waitlist.mode_for(student.status.as_deref());
            for request in student.course_requests() {
                let (kind, choices) = match &request.enrollment {
                    Some(enrollment) if enrollment.offering_id == offering.id => {
                        let reason = if offering.reschedule {
                            check(snapshot, &config.policy, &student, request, enrollment)
                        } else {
                            None
                        };
                        match reason {
                            Some(reason) => {
                                let mut choices = in_offering(&request.courses);
                                if choices.is_empty() {
                                    choices.push(enrollment.course_id);
                                }
                                (CandidateKind::Disrupted(reason), choices)
                            }
                            None if request.is_wait_listed(mode) => {
                                (CandidateKind::Upgrade, in_offering(request.better_choices()))
                            }
                            None => continue,
                        }
                    }
                    Some(_) if request.is_wait_listed(mode) => {
                        (CandidateKind::Upgrade, in_offering(request.better_choices()))
                    }
                    Some(_) => continue,
                    None if request.is_wait_listed(mode) => {
                        (CandidateKind::WaitListed, in_offering(&request.courses))
                    }
                    None => continue,
                };
                if choices.is_empty() {
                    continue;
                }
                candidates.push(SectioningRequest {
                    student: student.clone(),
                    request: request.clone(),
                    kind,
                    choices,
                    mode,
                });
            }
        }
        candidates
    }

    async fn process_candidate(
        &self,
        lock: &Lock,
        snapshot: &CatalogSnapshot,
        offering: &Offering,
        candidate: &SectioningRequest,
        queue: &mut BTreeSet<OfferingId>,
    ) -> AppResult<CandidateOutcome> {
        let ctx = &self.ctx;
        let now = ctx.clock.now();
        let view = ctx.store.offering_enrollments(offering.id).await?;
        let student = ctx
            .store
            .find_student(candidate.student.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {} not found", candidate.student.id)))?;
        let Some(request) = student.course_request(candidate.request.id) else {
            return Ok(self.outcome(
                candidate,
                offering.id,
                ResultType::False,
                Some("request no longer exists".into()),
            ));
        };
        if request.enrollment != candidate.request.enrollment {
            return Ok(self.outcome(
                candidate,
                offering.id,
                ResultType::False,
                Some("enrollment changed since the candidate list was built".into()),
            ));
        }

        let search = SearchContext {
            snapshot,
            offering,
            enrollments: &view,
            student: &student,
            request,
            choices: &candidate.choices,
            policy: &ctx.config.policy,
            deadlines: &ctx.deadlines,
            weighting: ctx.weighting.as_ref(),
            now,
            max_combinations: ctx.config.search.max_combinations,
        };
        let found = ctx.with_rng(|rng| best_enrollment(&search, rng));

        let Some(found) = found else {
            return match candidate.kind {
                CandidateKind::Disrupted(reason) => {
                    self.commit_wait_list(lock, snapshot, offering, candidate, reason, now)
                        .await
                }
                CandidateKind::WaitListed | CandidateKind::Upgrade => Ok(self.outcome(
                    candidate,
                    offering.id,
                    ResultType::False,
                    Some("no enrollment available".into()),
                )),
            };
        };
        if request
            .enrollment
            .as_ref()
            .is_some_and(|previous| previous.same_sections(&found))
        {
            return Ok(self.outcome(candidate, offering.id, ResultType::False, None));
        }

        match ctx.provider.resection(offering, &student, &found).await {
            Ok(confirmed) => {
                self.commit_enrollment(lock, snapshot, offering, candidate, confirmed, queue, now)
                    .await
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!(
                    student_id = %student.id,
                    offering_id = %offering.id,
                    error = %e,
                    "Enrollment provider rejected change"
                );
                self.record_failure(snapshot, offering, candidate, &found, &e, now)
                    .await?;
                Ok(self.outcome(candidate, offering.id, ResultType::Failure, Some(e.to_string())))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn commit_enrollment(
        &self,
        lock: &Lock,
        snapshot: &CatalogSnapshot,
        offering: &Offering,
        candidate: &SectioningRequest,
        confirmed: Enrollment,
        queue: &mut BTreeSet<OfferingId>,
        now: DateTime<Utc>,
    ) -> AppResult<CandidateOutcome> {
        let ctx = &self.ctx;
        let student_id = candidate.student.id;
        let request_id = candidate.request.id;
        let student_lock = ctx.locks.lock_student_within(lock, student_id, SOURCE).await?;
        let mut student = self.reload(candidate).await?;

        let top_priority = student
            .course_requests()
            .filter(|r| !r.alternative)
            .map(|r| r.priority)
            .max();
        let swap = student
            .course_request(request_id)
            .and_then(|r| r.swap_with);
        let mut dropped: Option<(RequestId, Enrollment)> = None;
        if let Some(course) = swap {
            let other = student
                .request_enrolled_in(course)
                .filter(|r| r.id != request_id)
                .map(|r| r.id);
            if let Some(other) = other.and_then(|id| student.course_request_mut(id)) {
                if let Some(enrollment) = other.enrollment.take() {
                    other.priority = 0;
                    other.alternative = false;
                    other.wait_list = false;
                    other.wait_listed_at = None;
                    dropped = Some((other.id, enrollment));
                }
            }
        }

        let request = student
            .course_request_mut(request_id)
            .ok_or_else(|| AppError::conflict(format!("request {request_id} disappeared")))?;
        let previous = request.enrollment.replace(confirmed.clone());
        if request.alternative {
            request.alternative = false;
            request.priority = top_priority.map_or(0, |p| p + 1);
        }
        if request.choice_index(confirmed.course_id) == Some(0) {
            request.wait_list = false;
            request.wait_listed_at = None;
        }
        if dropped.is_some() {
            request.swap_with = None;
        }

        let mut commit = StudentCommit::new(student);
        let added: Vec<_> = confirmed
            .sections
            .iter()
            .copied()
            .filter(|id| !previous.as_ref().is_some_and(|e| e.contains(*id)))
            .collect();
        let removed: Vec<_> = previous
            .iter()
            .flat_map(|e| e.sections.iter().copied())
            .filter(|id| !confirmed.contains(*id))
            .collect();
        commit.adjust_space(&added, 1);
        commit.adjust_space(&removed, -1);
        let mut entry = AuditEntry::new(student_id, Some(offering.id), "resection", ResultType::True, now)
            .with_wait_list_type(Some(candidate.wait_list_type()))
            .with_change(
                previous.as_ref().map(|e| describe(snapshot, e)),
                Some(describe(snapshot, &confirmed)),
            );
        if let Some(reason) = candidate.reason() {
            entry = entry.with_message(reason.to_string());
        }
        commit = commit.with_audit(entry);
        if let Some((_, enrollment)) = &dropped {
            commit.adjust_space(&enrollment.sections, -1);
            commit = commit.with_audit(
                AuditEntry::new(student_id, Some(enrollment.offering_id), "swap-drop", ResultType::True, now)
                    .with_wait_list_type(Some(candidate.wait_list_type()))
                    .with_change(Some(describe(snapshot, enrollment)), None),
            );
        }
        ctx.store.commit(commit).await?;
        drop(student_lock);

        self.notify_changed(candidate, offering.id, previous.as_ref(), Some(&confirmed), ResultType::True, None, now)
            .await;
        if let Some((dropped_request, enrollment)) = &dropped {
            ctx.notifier
                .notify(DomainEvent::new(
                    SOURCE,
                    now,
                    EventPayload::Enrollment(EnrollmentEvent::Dropped {
                        student_id,
                        request_id: *dropped_request,
                        course_id: enrollment.course_id,
                        sections: enrollment.sections.clone(),
                    }),
                ))
                .await;
            self.release(enrollment.offering_id, offering.id, queue, now).await;
        }
        if let Some(previous) = &previous {
            self.release(previous.offering_id, offering.id, queue, now).await;
        }

        Ok(self.outcome(candidate, offering.id, ResultType::True, None))
    }

    async fn commit_wait_list(
        &self,
        lock: &Lock,
        snapshot: &CatalogSnapshot,
        offering: &Offering,
        candidate: &SectioningRequest,
        reason: ReschedulingReason,
        now: DateTime<Utc>,
    ) -> AppResult<CandidateOutcome> {
        let ctx = &self.ctx;
        let student_id = candidate.student.id;
        let student_lock = ctx.locks.lock_student_within(lock, student_id, SOURCE).await?;
        let mut student = self.reload(candidate).await?;
        let request = student
            .course_request_mut(candidate.request.id)
            .ok_or_else(|| AppError::conflict(format!("request {} disappeared", candidate.request.id)))?;
        let previous = request.enrollment.take();
        request.wait_list = true;
        request.wait_listed_at = Some(now);

        let mut commit = StudentCommit::new(student);
        if let Some(previous) = &previous {
            commit.adjust_space(&previous.sections, -1);
        }
        commit = commit.with_audit(
            AuditEntry::new(student_id, Some(offering.id), "resection", ResultType::Null, now)
                .with_wait_list_type(Some(candidate.wait_list_type()))
                .with_change(previous.as_ref().map(|e| describe(snapshot, e)), None)
                .with_message(reason.to_string()),
        );
        ctx.store.commit(commit).await?;
        drop(student_lock);

        self.notify_changed(
            candidate,
            offering.id,
            previous.as_ref(),
            None,
            ResultType::Null,
            Some(reason.to_string()),
            now,
        )
        .await;
        Ok(self.outcome(candidate, offering.id, ResultType::Null, Some(reason.to_string())))
    }

    async fn record_failure(
        &self,
        snapshot: &CatalogSnapshot,
        offering: &Offering,
        candidate: &SectioningRequest,
        attempted: &Enrollment,
        error: &AppError,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let ctx = &self.ctx;
        ctx.store
            .append_audit(
                AuditEntry::new(candidate.student.id, Some(offering.id), "resection", ResultType::Failure, now)
                    .with_wait_list_type(Some(candidate.wait_list_type()))
                    .with_change(
                        candidate.last_enrollment().map(|e| describe(snapshot, e)),
                        Some(describe(snapshot, attempted)),
                    )
                    .with_message(error.message.clone()),
            )
            .await?;
        if ctx.config.policy.notify_on_failure {
            self.notify_changed(
                candidate,
                offering.id,
                candidate.last_enrollment(),
                candidate.last_enrollment(),
                ResultType::Failure,
                Some(error.message.clone()),
                now,
            )
            .await;
        }
        Ok(())
    }

    async fn reload(&self, candidate: &SectioningRequest) -> AppResult<Student> {
        let student = self
            .ctx
            .store
            .find_student(candidate.student.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {} not found", candidate.student.id)))?;
        let unchanged = student
            .course_request(candidate.request.id)
            .is_some_and(|r| r.enrollment == candidate.request.enrollment);
        if !unchanged {
            return Err(AppError::conflict(format!(
                "request {} changed during resectioning",
                candidate.request.id
            )));
        }
        Ok(student)
    }

    /// Queues an offering that gained space, unless it is the one being
    /// processed.
    async fn release(
        &self,
        freed: OfferingId,
        current: OfferingId,
        queue: &mut BTreeSet<OfferingId>,
        now: DateTime<Utc>,
    ) {
        if freed == current || !queue.insert(freed) {
            return;
        }
        debug!(offering_id = %freed, "Queued offering for recheck");
        self.ctx
            .notifier
            .notify(DomainEvent::new(
                SOURCE,
                now,
                EventPayload::Offering(OfferingEvent::SpaceReleased { offering_id: freed }),
            ))
            .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn notify_changed(
        &self,
        candidate: &SectioningRequest,
        offering_id: OfferingId,
        before: Option<&Enrollment>,
        after: Option<&Enrollment>,
        result: ResultType,
        failure: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.ctx
            .notifier
            .notify(DomainEvent::new(
                SOURCE,
                now,
                EventPayload::Enrollment(EnrollmentEvent::Changed {
                    student_id: candidate.student.id,
                    request_id: candidate.request.id,
                    offering_id,
                    old_course: before.map(|e| e.course_id),
                    old_sections: before.map(|e| e.sections.clone()).unwrap_or_default(),
                    new_course: after.map(|e| e.course_id),
                    new_sections: after.map(|e| e.sections.clone()).unwrap_or_default(),
                    result,
                    failure,
                }),
            ))
            .await;
    }

    fn outcome(
        &self,
        candidate: &SectioningRequest,
        offering_id: OfferingId,
        result: ResultType,
        message: Option<String>,
    ) -> CandidateOutcome {
        CandidateOutcome {
            student_id: candidate.student.id,
            request_id: candidate.request.id,
            offering_id,
            result,
            reason: candidate.reason(),
            message,
        }
    }
}

/// Human-readable enrollment summary, e.g. `MATH 101: Lec 1, Rec 2`.
pub fn describe(snapshot: &CatalogSnapshot, enrollment: &Enrollment) -> String {
    let course = snapshot
        .course(enrollment.course_id)
        .map_or_else(|| enrollment.course_id.to_string(), |c| c.name());
    let sections: Vec<String> = enrollment
        .sections
        .iter()
        .map(|id| {
            snapshot
                .section(*id)
                .map_or_else(|| id.to_string(), |s| s.name.clone())
        })
        .collect();
    format!("{course}: {}", sections.join(", "))
}
