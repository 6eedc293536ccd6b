//! Provider used when no outside system is involved.

use async_trait::async_trait;
use tracing::trace;

use sectioning_core::result::AppResult;
use sectioning_entity::offering::Offering;
use sectioning_entity::student::{Enrollment, Student};

use super::EnrollmentProvider;

/// Accepts every candidate unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

#[async_trait]
impl EnrollmentProvider for LocalProvider {
    async fn resection(
        &self,
        offering: &Offering,
        student: &Student,
        candidate: &Enrollment,
    ) -> AppResult<Enrollment> {
        trace!(
            offering_id = %offering.id,
            student_id = %student.id,
            "Local provider accepted enrollment"
        );
        Ok(candidate.clone())
    }
}
