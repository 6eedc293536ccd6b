//! Reservation entity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{ConfigId, OfferingId, ReservationId, SectionId};

use super::scope::ReservationScope;

/// Space held back in an offering for students matching a scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,
    /// The owning offering.
    pub offering_id: OfferingId,
    /// Who the reservation is for.
    pub scope: ReservationScope,
    /// Number of reserved seats, `-1` for unlimited.
    pub limit: i32,
    /// Configurations the reservation is restricted to (empty = all).
    #[serde(default)]
    pub configs: BTreeSet<ConfigId>,
    /// Sections the reservation is restricted to (empty = all).
    #[serde(default)]
    pub sections: BTreeSet<SectionId>,
    /// Students holding this reservation may exceed nominal limits.
    #[serde(default)]
    pub can_assign_over_limit: bool,
    /// Students holding this reservation may have time conflicts.
    #[serde(default)]
    pub allow_overlap: bool,
    /// Instant after which the reservation no longer applies.
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Whether the reservation has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|at| at <= now)
    }

    /// The enforced limit, `None` when unlimited.
    ///
    /// Individual reservations without an explicit limit hold one seat per
    /// listed student.
    pub fn effective_limit(&self) -> Option<usize> {
        if self.limit >= 0 {
            return Some(self.limit as usize);
        }
        match &self.scope {
            ReservationScope::Individual { students } => Some(students.len()),
            _ => None,
        }
    }

    /// Whether the reservation restricts configurations or sections.
    pub fn is_restricted(&self) -> bool {
        !self.configs.is_empty() || !self.sections.is_empty()
    }
}
