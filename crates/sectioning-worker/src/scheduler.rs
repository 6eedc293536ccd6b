//! Cron scheduler for the periodic wait-list sweep.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use sectioning_core::error::AppError;
use sectioning_engine::Engine;

use crate::queue::RecheckQueue;

/// Cron-based scheduler queueing every wait-listed offering
pub struct SweepScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Engine listing the wait-listed offerings
    engine: Engine,
    /// Queue receiving the offerings
    queue: Arc<RecheckQueue>,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler").finish()
    }
}

impl SweepScheduler {
    /// Create a new scheduler
    pub async fn new(engine: Engine, queue: Arc<RecheckQueue>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            engine,
            queue,
        })
    }

    /// Register the wait-list sweep; an empty schedule registers nothing
    pub async fn register_sweep(&self, schedule: &str) -> Result<(), AppError> {
        if schedule.trim().is_empty() {
            tracing::info!("Wait-list sweep disabled");
            return Ok(());
        }

        let engine = self.engine.clone();
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let engine = engine.clone();
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                let offerings = engine.wait_listed_offerings().await;
                tracing::debug!("Sweeping {} wait-listed offering(s)", offerings.len());
                queue.enqueue_all(offerings).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid sweep schedule '{}': {}", schedule, e))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {}", e)))?;

        tracing::info!("Registered: wait-list sweep ({})", schedule);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
