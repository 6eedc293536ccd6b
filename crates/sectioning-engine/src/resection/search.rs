//! Best-alternative enrollment search.
//!
//! Depth-first enumeration over the configurations of the triggering
//! offering, one section per subpart, parents first. Partial selections are
//! pruned on cancellation, parent links, deadlines, past sections, section
//! capacity (unless overridden or reserved), and time overlaps; complete ones are checked structurally and
//! against all capacity levels, then weighted. Ties on the best weight are
//! broken uniformly at random.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{trace, warn};

use sectioning_core::config::PolicyConfig;
use sectioning_core::types::id::{CourseId, SectionId};
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::offering::{InstrConfig, Offering, Section, Subpart};
use sectioning_entity::student::{CourseRequest, Enrollment, OfferingEnrollments, Student};

use super::reason::allows_overlap;
use super::weights::EnrollmentWeighting;
use crate::deadline::{DeadlineChecker, DeadlineKind};
use crate::quota::Quota;
use crate::validator::inspect;
use crate::validator::structure::overlap_allowed;

const EPSILON: f64 = 1e-9;

/// Inputs of one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// Catalog snapshot.
    pub snapshot: &'a CatalogSnapshot,
    /// The triggering offering.
    pub offering: &'a Offering,
    /// Current enrollments of the offering.
    pub enrollments: &'a OfferingEnrollments,
    /// The student.
    pub student: &'a Student,
    /// The request being re-sectioned.
    pub request: &'a CourseRequest,
    /// Courses of the offering to try, best first.
    pub choices: &'a [CourseId],
    /// Enrollment policy.
    pub policy: &'a PolicyConfig,
    /// Deadline predicate.
    pub deadlines: &'a DeadlineChecker,
    /// Candidate weighting.
    pub weighting: &'a dyn EnrollmentWeighting,
    /// Current time.
    pub now: DateTime<Utc>,
    /// Stop after this many complete candidates.
    pub max_combinations: usize,
}

/// Finds the best legal enrollment, if any.
pub fn best_enrollment<R: Rng + ?Sized>(ctx: &SearchContext<'_>, rng: &mut R) -> Option<Enrollment> {
    let mut state = SearchState {
        ctx,
        quota: Quota::new(ctx.snapshot, ctx.offering, ctx.enrollments, ctx.now),
        blocking: blocking_sections(ctx),
        previous: ctx
            .request
            .enrollment
            .iter()
            .flat_map(|e| e.sections.iter().copied())
            .collect(),
        kind: if ctx.request.enrollment.is_some() {
            DeadlineKind::Change
        } else {
            DeadlineKind::New
        },
        chosen: Vec::new(),
        found: 0,
        limited: false,
        best: Vec::new(),
        best_weight: f64::NEG_INFINITY,
    };

    for course in ctx.choices {
        if !ctx.offering.has_course(*course) {
            continue;
        }
        for config in ctx.snapshot.configs_of(ctx.offering) {
            let subparts = ctx.snapshot.subparts_of(config);
            if subparts.is_empty() {
                continue;
            }
            state.search(*course, config, &subparts, 0);
        }
    }

    if state.limited {
        warn!(
            student_id = %ctx.student.id,
            offering_id = %ctx.offering.id,
            limit = ctx.max_combinations,
            "Search stopped at the combination limit"
        );
    }
    trace!(
        student_id = %ctx.student.id,
        offering_id = %ctx.offering.id,
        combinations = state.found,
        best = state.best.len(),
        "Search finished"
    );

    match state.best.len() {
        0 => None,
        1 => state.best.pop(),
        n => {
            let pick = rng.gen_range(0..n);
            Some(state.best.swap_remove(pick))
        }
    }
}

/// Sections of the student's other enrollments the candidate must not
/// overlap: those of requests at least as important, unless they permit
/// overlaps or are about to be swapped out.
fn blocking_sections<'a>(ctx: &SearchContext<'a>) -> Vec<&'a Section> {
    if ctx.request.overrides.time_conflict {
        return Vec::new();
    }
    let rank = |r: &CourseRequest| (r.alternative, r.priority);
    ctx.student
        .enrollments()
        .filter(|(other, _)| other.id != ctx.request.id)
        .filter(|(other, _)| rank(other) <= rank(ctx.request))
        .filter(|(_, e)| ctx.request.swap_with != Some(e.course_id))
        .filter(|(other, e)| !allows_overlap(ctx.snapshot, other, e))
        .flat_map(|(_, e)| e.sections.iter())
        .filter_map(|id| ctx.snapshot.section(*id))
        .collect()
}

struct SearchState<'c, 'a> {
    ctx: &'c SearchContext<'a>,
    quota: Quota<'a>,
    blocking: Vec<&'a Section>,
    previous: BTreeSet<SectionId>,
    kind: DeadlineKind,
    chosen: Vec<&'a Section>,
    found: usize,
    limited: bool,
    best: Vec<Enrollment>,
    best_weight: f64,
}

impl<'a> SearchState<'_, 'a> {
    fn search(&mut self, course: CourseId, config: &'a InstrConfig, subparts: &[&'a Subpart], depth: usize) {
        if self.found >= self.ctx.max_combinations {
            self.limited = true;
            return;
        }
        let Some(subpart) = subparts.get(depth) else {
            self.complete(course, config);
            return;
        };
        for section in self.ctx.snapshot.sections_of(subpart) {
            if !self.admissible(course, config, section) {
                continue;
            }
            self.chosen.push(section);
            self.search(course, config, subparts, depth + 1);
            self.chosen.pop();
            if self.limited {
                return;
            }
        }
    }

    fn admissible(&self, course: CourseId, config: &InstrConfig, section: &Section) -> bool {
        let ctx = self.ctx;
        let held = self.previous.contains(&section.id);
        if section.cancelled && !(held && ctx.policy.allow_keep_cancelled) {
            return false;
        }
        if let Some(parent) = section.parent_id {
            if !self.chosen.iter().any(|s| s.id == parent) {
                return false;
            }
        }
        if !held {
            if !ctx
                .deadlines
                .check_deadline(ctx.offering.id, Some(section), ctx.now, self.kind)
            {
                return false;
            }
            if ctx.policy.avoid_past_sections
                && section
                    .time
                    .as_ref()
                    .is_some_and(|t| t.has_started(ctx.now.date_naive()))
            {
                return false;
            }
            if !self.quota.section_admits(
                ctx.student,
                ctx.request.overrides,
                course,
                config,
                section,
            ) {
                return false;
            }
        }
        if self
            .chosen
            .iter()
            .any(|s| s.overlaps(section) && !overlap_allowed(ctx.snapshot, ctx.offering, s, section))
        {
            return false;
        }
        config.allow_overlap || !self.blocking.iter().any(|s| s.overlaps(section))
    }

    fn complete(&mut self, course: CourseId, config: &InstrConfig) {
        let ctx = self.ctx;
        let sections: Vec<SectionId> = self.chosen.iter().map(|s| s.id).collect();
        if !inspect(ctx.snapshot, ctx.offering, &sections).is_empty() {
            return;
        }
        let capacity = self.quota.check_capacity(
            ctx.student,
            ctx.request.overrides,
            course,
            config,
            &sections,
        );
        if !capacity.is_ok() {
            return;
        }
        self.found += 1;
        let candidate = Enrollment {
            offering_id: ctx.offering.id,
            course_id: course,
            config_id: config.id,
            sections,
            reservation_id: capacity.reservation,
            approval: None,
            timestamp: ctx.now,
        };
        let weight = ctx.weighting.weight(
            ctx.snapshot,
            ctx.request,
            ctx.request.enrollment.as_ref(),
            &candidate,
        );
        if weight > self.best_weight + EPSILON {
            self.best_weight = weight;
            self.best.clear();
            self.best.push(candidate);
        } else if (weight - self.best_weight).abs() <= EPSILON {
            self.best.push(candidate);
        }
    }
}
