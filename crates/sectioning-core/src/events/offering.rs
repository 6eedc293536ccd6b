//! Offering-level events.

use serde::{Deserialize, Serialize};

use crate::types::id::OfferingId;

/// Events related to offering capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OfferingEvent {
    /// Space opened up in an offering and it was queued for recheck.
    SpaceReleased {
        /// The offering.
        offering_id: OfferingId,
    },
    /// An offering recheck pass finished.
    Rechecked {
        /// The offering.
        offering_id: OfferingId,
        /// Number of candidates examined.
        candidates: usize,
        /// Number of committed changes.
        changed: usize,
        /// Number of failed candidates.
        failed: usize,
    },
}
