//! External enrollment provider boundary.

pub mod local;

use async_trait::async_trait;

use sectioning_core::result::AppResult;
use sectioning_entity::offering::Offering;
use sectioning_entity::student::{Enrollment, Student};

pub use local::LocalProvider;

/// Outside system of record that confirms an enrollment before it is
/// committed locally (e.g. a registrar).
#[async_trait]
pub trait EnrollmentProvider: Send + Sync + std::fmt::Debug {
    /// Confirms `candidate` for the student, returning the enrollment to
    /// commit. An error rejects the change for this student only.
    async fn resection(
        &self,
        offering: &Offering,
        student: &Student,
        candidate: &Enrollment,
    ) -> AppResult<Enrollment>;
}
