//! Notifier writing events to the log.

use async_trait::async_trait;
use tracing::info;

use sectioning_core::events::{DomainEvent, EventPayload};
use sectioning_core::events::enrollment::EnrollmentEvent;

use super::Notifier;

/// Records every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: DomainEvent) {
        match &event.payload {
            EventPayload::Enrollment(EnrollmentEvent::Changed {
                student_id,
                offering_id,
                result,
                failure,
                ..
            }) => info!(
                event_id = %event.id,
                source = %event.source,
                student_id = %student_id,
                offering_id = %offering_id,
                result = %result,
                failure = failure.as_deref().unwrap_or(""),
                "Enrollment changed"
            ),
            EventPayload::Enrollment(EnrollmentEvent::Dropped {
                student_id,
                course_id,
                ..
            }) => info!(
                event_id = %event.id,
                source = %event.source,
                student_id = %student_id,
                course_id = %course_id,
                "Course dropped"
            ),
            EventPayload::Offering(offering) => info!(
                event_id = %event.id,
                source = %event.source,
                event = ?offering,
                "Offering event"
            ),
        }
    }
}
