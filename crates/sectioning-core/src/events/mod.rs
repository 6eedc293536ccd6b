//! Domain events emitted by sectioning operations.
//!
//! Events are handed to the notification dispatcher after a commit and
//! consumed by student notifications, audit exporters, and the recheck
//! worker.

pub mod enrollment;
pub mod offering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use enrollment::EnrollmentEvent;
pub use offering::OfferingEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The operation that caused the event (e.g. `check-offering`).
    pub source: String,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A student enrollment event.
    Enrollment(EnrollmentEvent),
    /// An offering-level event.
    Offering(OfferingEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(source: impl Into<String>, timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            source: source.into(),
            payload,
        }
    }
}
