//! The engine facade.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use sectioning_core::result::AppResult;
use sectioning_core::types::id::{OfferingId, StudentId};
use sectioning_entity::assignment::ClassAssignment;
use sectioning_entity::catalog::{CatalogData, CatalogSnapshot};

use crate::availability::changed_offerings;
use crate::context::EngineContext;
use crate::enrollment::{EnrollOutcome, EnrollmentService};
use crate::lock::LockManager;
use crate::resection::{RecheckReport, ResectioningService};
use crate::store::EnrollmentStore;
use crate::validator::{ValidatedGrouping, ValidationError, ValidationMode};

/// Entry point for validation, enrollment, and resectioning.
#[derive(Debug, Clone)]
pub struct Engine {
    ctx: Arc<EngineContext>,
    enrollment: EnrollmentService,
    resection: ResectioningService,
}

impl Engine {
    /// Creates the engine around a context.
    pub fn new(ctx: EngineContext) -> Self {
        let ctx = Arc::new(ctx);
        Self {
            enrollment: EnrollmentService::new(ctx.clone()),
            resection: ResectioningService::new(ctx.clone()),
            ctx,
        }
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// The system of record.
    pub fn store(&self) -> &Arc<dyn EnrollmentStore> {
        &self.ctx.store
    }

    /// The lock manager.
    pub fn locks(&self) -> &Arc<LockManager> {
        &self.ctx.locks
    }

    /// The current catalog snapshot.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.ctx.catalog.current().await
    }

    /// Validates a candidate schedule for a student.
    pub async fn validate(
        &self,
        student_id: StudentId,
        assignments: &[ClassAssignment],
        mode: ValidationMode,
    ) -> Result<ValidatedGrouping, ValidationError> {
        self.enrollment.validate(student_id, assignments, mode).await
    }

    /// Validates and commits a candidate schedule.
    pub async fn enroll(
        &self,
        student_id: StudentId,
        assignments: &[ClassAssignment],
    ) -> Result<EnrollOutcome, ValidationError> {
        self.enrollment.enroll(student_id, assignments).await
    }

    /// Rechecks the offerings; `true` when no candidate failed.
    pub async fn recheck_offerings(
        &self,
        offerings: &[OfferingId],
        skip: Option<&BTreeSet<StudentId>>,
        only: Option<&BTreeSet<StudentId>>,
    ) -> AppResult<bool> {
        let report = self.recheck_report(offerings, skip, only).await?;
        Ok(report.failed() == 0)
    }

    /// Rechecks the offerings and returns the full report.
    pub async fn recheck_report(
        &self,
        offerings: &[OfferingId],
        skip: Option<&BTreeSet<StudentId>>,
        only: Option<&BTreeSet<StudentId>>,
    ) -> AppResult<RecheckReport> {
        let empty = BTreeSet::new();
        self.resection
            .recheck_offerings(offerings, skip.unwrap_or(&empty), only)
            .await
    }

    /// Swaps in a new catalog and returns the offerings that gained space.
    pub async fn refresh_catalog(&self, data: CatalogData) -> AppResult<Vec<OfferingId>> {
        let snapshot = CatalogSnapshot::build(data)?;
        let lock = self.ctx.locks.write_lock("refresh-catalog").await?;
        let previous = self.ctx.catalog.replace(&lock, snapshot).await;
        let current = self.ctx.catalog.current().await;
        drop(lock);
        let changed = changed_offerings(&previous, &current);
        info!(changed = changed.len(), "Catalog refreshed");
        Ok(changed)
    }

    /// Offerings with wait-listing enabled.
    pub async fn wait_listed_offerings(&self) -> Vec<OfferingId> {
        self.snapshot()
            .await
            .offerings()
            .into_iter()
            .filter(|o| o.wait_list)
            .map(|o| o.id)
            .collect()
    }

    /// Stops the engine; pending lock acquisitions fail with a shutdown
    /// error.
    pub fn shutdown(&self) {
        self.ctx.locks.shutdown();
    }
}
