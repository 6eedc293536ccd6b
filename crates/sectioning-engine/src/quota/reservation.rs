//! Reservation applicability and exhaustion.

use chrono::{DateTime, Utc};

use sectioning_core::types::id::{CourseId, SectionId, StudentId};
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::offering::{InstrConfig, Offering};
use sectioning_entity::reservation::Reservation;
use sectioning_entity::student::{OfferingEnrollments, Student};

/// Quota view of one offering at one instant.
#[derive(Debug, Clone, Copy)]
pub struct Quota<'a> {
    pub(crate) snapshot: &'a CatalogSnapshot,
    pub(crate) offering: &'a Offering,
    pub(crate) enrollments: &'a OfferingEnrollments,
    pub(crate) now: DateTime<Utc>,
}

impl<'a> Quota<'a> {
    /// Creates a quota view.
    pub fn new(
        snapshot: &'a CatalogSnapshot,
        offering: &'a Offering,
        enrollments: &'a OfferingEnrollments,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot,
            offering,
            enrollments,
            now,
        }
    }

    /// Non-expired reservations of the offering, narrowest scope first.
    pub fn active_reservations(&self) -> Vec<&'a Reservation> {
        let mut reservations: Vec<&'a Reservation> = self
            .snapshot
            .reservations_of(self.offering)
            .into_iter()
            .filter(|r| !r.is_expired(self.now))
            .collect();
        reservations.sort_by_key(|r| (r.scope.rank(), r.id));
        reservations
    }

    /// Reservations that cover the student taking `course` with the given
    /// configuration and sections, in application order.
    pub fn applicable_reservations(
        &self,
        student: &Student,
        course: CourseId,
        config: Option<&InstrConfig>,
        sections: &[SectionId],
    ) -> Vec<&'a Reservation> {
        self.active_reservations()
            .into_iter()
            .filter(|r| r.scope.matches(student, course))
            .filter(|r| self.is_compatible(r, config, sections))
            .collect()
    }

    /// Whether the reservation's config/section restrictions allow the
    /// selection.
    pub fn is_compatible(
        &self,
        reservation: &Reservation,
        config: Option<&InstrConfig>,
        sections: &[SectionId],
    ) -> bool {
        let Some(config) = config else {
            return true;
        };
        if !reservation.is_restricted() {
            return true;
        }
        let restricts_config = reservation.configs.contains(&config.id)
            || reservation
                .sections
                .iter()
                .any(|s| self.snapshot.config_of_section(*s).is_some_and(|c| c.id == config.id));
        if !restricts_config {
            return false;
        }
        // Within a restricted subpart, the chosen section must be one of the
        // reserved ones.
        sections.iter().all(|id| {
            let Some(section) = self.snapshot.section(*id) else {
                return false;
            };
            let Some(subpart) = self.snapshot.subpart(section.subpart_id) else {
                return false;
            };
            let restricted = subpart
                .sections
                .iter()
                .any(|s| reservation.sections.contains(s));
            !restricted || reservation.sections.contains(id)
        })
    }

    /// Enrollments currently attributed to the reservation, not counting the
    /// student.
    pub fn consumed(&self, reservation: &Reservation, student: StudentId) -> usize {
        let own = self
            .enrollments
            .of_student(student)
            .is_some_and(|r| r.enrollment.reservation_id == Some(reservation.id));
        self.enrollments.count_reservation(reservation.id) - usize::from(own)
    }

    /// Whether the reservation has no room left for the student.
    ///
    /// A student already enrolled under the reservation is never turned away.
    pub fn is_exhausted(&self, reservation: &Reservation, student: StudentId) -> bool {
        match reservation.effective_limit() {
            Some(limit) => self.consumed(reservation, student) >= limit,
            None => false,
        }
    }

    /// Seats the reservation still holds back, `None` when unlimited.
    pub fn remaining(&self, reservation: &Reservation, student: StudentId) -> Option<i64> {
        reservation
            .effective_limit()
            .map(|limit| (limit as i64 - self.consumed(reservation, student) as i64).max(0))
    }

    /// The first applicable reservation with room for the student.
    pub fn select_reservation(
        &self,
        student: &Student,
        course: CourseId,
        config: Option<&InstrConfig>,
        sections: &[SectionId],
    ) -> Option<&'a Reservation> {
        self.applicable_reservations(student, course, config, sections)
            .into_iter()
            .find(|r| !self.is_exhausted(r, student.id))
    }
}
