//! Recheck runner: drains the queue and resections the offerings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time;

use sectioning_core::config::WorkerConfig;
use sectioning_core::types::id::OfferingId;
use sectioning_engine::{Engine, RecheckReport};

use crate::error::RecheckError;
use crate::queue::RecheckQueue;

/// Upper bound on waiting for in-flight rechecks at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Background runner processing queued offerings
#[derive(Debug, Clone)]
pub struct RecheckRunner {
    /// Engine performing the rechecks
    engine: Engine,
    /// Offerings waiting for a recheck
    queue: Arc<RecheckQueue>,
    /// Worker configuration
    config: WorkerConfig,
}

impl RecheckRunner {
    /// Create a new runner
    pub fn new(engine: Engine, queue: Arc<RecheckQueue>, config: WorkerConfig) -> Self {
        Self {
            engine,
            queue,
            config,
        }
    }

    /// Run until the cancel signal is received
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Recheck runner started with concurrency={}, poll_interval={}s",
            self.config.concurrency,
            self.config.poll_interval_seconds
        );

        let permits = self.config.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Recheck runner received shutdown signal");
                        break;
                    }
                }
                _ = self.queue.notified() => {}
                _ = time::sleep(poll_interval) => {}
            }
            self.dispatch(&semaphore).await;
        }

        tracing::info!("Recheck runner waiting for in-flight rechecks to complete...");
        let _ = time::timeout(DRAIN_TIMEOUT, semaphore.acquire_many(permits as u32)).await;
        tracing::info!("Recheck runner shut down complete");
    }

    /// Process everything queued right now, one offering after another
    pub async fn run_once(&self) -> Vec<Result<RecheckReport, RecheckError>> {
        let mut results = Vec::new();
        for offering in self.queue.drain().await {
            let result = Self::execute(&self.engine, offering).await;
            Self::settle(&self.queue, self.retry_delay(), offering, &result);
            results.push(result);
        }
        results
    }

    /// Recheck one offering
    pub async fn execute(engine: &Engine, offering: OfferingId) -> Result<RecheckReport, RecheckError> {
        engine
            .recheck_report(&[offering], None, None)
            .await
            .map_err(RecheckError::classify)
    }

    async fn dispatch(&self, semaphore: &Arc<Semaphore>) {
        for offering in self.queue.drain().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    self.queue.enqueue(offering).await;
                    return;
                }
            };
            let engine = self.engine.clone();
            let queue = Arc::clone(&self.queue);
            let retry_delay = self.retry_delay();
            tokio::spawn(async move {
                let _permit = permit;
                let result = Self::execute(&engine, offering).await;
                Self::settle(&queue, retry_delay, offering, &result);
            });
        }
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_seconds.max(1))
    }

    fn settle(
        queue: &Arc<RecheckQueue>,
        retry_delay: Duration,
        offering: OfferingId,
        result: &Result<RecheckReport, RecheckError>,
    ) {
        match result {
            Ok(report) => {
                tracing::info!(
                    "Recheck of offering {} finished: processed={}, changed={}, failed={}",
                    offering,
                    report.processed.len(),
                    report.changed(),
                    report.failed()
                );
                for busy in &report.busy {
                    requeue_later(queue, *busy, retry_delay);
                }
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!("Recheck of offering {} failed (transient): {}", offering, e);
                requeue_later(queue, offering, retry_delay);
            }
            Err(e) if e.is_shutdown() => {
                tracing::debug!("Recheck of offering {} stopped by shutdown", offering);
            }
            Err(e) => {
                tracing::error!("Recheck of offering {} failed: {}", offering, e);
            }
        }
    }
}

/// Puts an offering back on the queue after a delay.
fn requeue_later(queue: &Arc<RecheckQueue>, offering: OfferingId, delay: Duration) {
    let queue = Arc::clone(queue);
    tokio::spawn(async move {
        time::sleep(delay).await;
        queue.enqueue(offering).await;
    });
}
