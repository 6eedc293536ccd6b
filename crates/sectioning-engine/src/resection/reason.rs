//! Classification of committed enrollments that need rescheduling.

use std::fmt;

use serde::{Deserialize, Serialize};

use sectioning_core::config::PolicyConfig;
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::student::{CourseRequest, Enrollment, Student};

use crate::validator::StructureIssue;
use crate::validator::inspect;

/// Why a committed enrollment is no longer valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReschedulingReason {
    /// Sections from more than one configuration.
    MultipleConfigs,
    /// Fewer sections than subparts (or a section vanished).
    MissingClass,
    /// More sections than subparts.
    MultipleEnrollments,
    /// Duplicate subpart, broken parent link, or broken linked sections.
    ClassLink,
    /// Internal or cross-request overlap.
    TimeConflict,
    /// A section was cancelled.
    ClassCancelled,
}

impl fmt::Display for ReschedulingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MultipleConfigs => "MULTIPLE_CONFIGS",
            Self::MissingClass => "MISSING_CLASS",
            Self::MultipleEnrollments => "MULTIPLE_ENRLS",
            Self::ClassLink => "CLASS_LINK",
            Self::TimeConflict => "TIME_CONFLICT",
            Self::ClassCancelled => "CLASS_CANCELLED",
        };
        f.write_str(label)
    }
}

/// Checks a committed enrollment of `request`.
///
/// Returns `None` when the enrollment is still valid under the current
/// snapshot and policy.
pub fn check(
    snapshot: &CatalogSnapshot,
    policy: &PolicyConfig,
    student: &Student,
    request: &CourseRequest,
    enrollment: &Enrollment,
) -> Option<ReschedulingReason> {
    let Some(offering) = snapshot.offering(enrollment.offering_id) else {
        return Some(ReschedulingReason::MissingClass);
    };
    let issues = inspect(snapshot, offering, &enrollment.sections);

    if issues
        .iter()
        .any(|i| matches!(i, StructureIssue::MultipleConfigs(_)))
    {
        return Some(ReschedulingReason::MultipleConfigs);
    }
    if issues
        .iter()
        .any(|i| matches!(i, StructureIssue::UnknownSection(_) | StructureIssue::Incomplete(_)))
    {
        return Some(ReschedulingReason::MissingClass);
    }
    if issues.iter().any(|i| matches!(i, StructureIssue::TooMany)) {
        return Some(ReschedulingReason::MultipleEnrollments);
    }
    if issues.iter().any(|i| {
        matches!(
            i,
            StructureIssue::DuplicateSubpart(_)
                | StructureIssue::ParentMismatch { .. }
                | StructureIssue::Unlinked(_)
        )
    }) {
        return Some(ReschedulingReason::ClassLink);
    }
    if snapshot
        .config(enrollment.config_id)
        .is_none_or(|c| c.offering_id != offering.id)
    {
        return Some(ReschedulingReason::MultipleConfigs);
    }

    if !policy.allow_keep_time_conflict {
        if issues.iter().any(StructureIssue::is_overlap) {
            return Some(ReschedulingReason::TimeConflict);
        }
        if has_cross_conflict(snapshot, student, request, enrollment) {
            return Some(ReschedulingReason::TimeConflict);
        }
    }

    if !policy.allow_keep_cancelled
        && enrollment
            .sections
            .iter()
            .filter_map(|id| snapshot.section(*id))
            .any(|s| s.cancelled)
    {
        return Some(ReschedulingReason::ClassCancelled);
    }

    None
}

/// Whether the enrollment overlaps another enrollment of the student that
/// does not permit overlaps.
fn has_cross_conflict(
    snapshot: &CatalogSnapshot,
    student: &Student,
    request: &CourseRequest,
    enrollment: &Enrollment,
) -> bool {
    if allows_overlap(snapshot, request, enrollment) {
        return false;
    }
    let mine: Vec<_> = enrollment
        .sections
        .iter()
        .filter_map(|id| snapshot.section(*id))
        .collect();
    student
        .enrollments()
        .filter(|(other, _)| other.id != request.id)
        .filter(|(other, e)| !allows_overlap(snapshot, other, e))
        .any(|(_, e)| {
            e.sections
                .iter()
                .filter_map(|id| snapshot.section(*id))
                .any(|theirs| mine.iter().any(|s| s.overlaps(theirs)))
        })
}

pub(crate) fn allows_overlap(
    snapshot: &CatalogSnapshot,
    request: &CourseRequest,
    enrollment: &Enrollment,
) -> bool {
    request.overrides.time_conflict
        || snapshot
            .config(enrollment.config_id)
            .is_some_and(|c| c.allow_overlap)
        || enrollment
            .reservation_id
            .and_then(|id| snapshot.reservation(id))
            .is_some_and(|r| r.allow_overlap)
}
