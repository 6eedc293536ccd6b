//! Queue of offerings waiting for a recheck.

use std::collections::BTreeSet;

use tokio::sync::{Mutex, Notify};

use sectioning_core::types::id::OfferingId;

/// De-duplicating set of offerings to recheck.
///
/// Enqueuing wakes the runner; an offering queued twice before the runner
/// gets to it is processed once.
#[derive(Debug, Default)]
pub struct RecheckQueue {
    /// Offerings waiting for a recheck
    pending: Mutex<BTreeSet<OfferingId>>,
    /// Wakes the runner
    notify: Notify,
}

impl RecheckQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one offering
    pub async fn enqueue(&self, offering: OfferingId) {
        self.enqueue_all([offering]).await;
    }

    /// Queue several offerings
    pub async fn enqueue_all(&self, offerings: impl IntoIterator<Item = OfferingId>) {
        let added = {
            let mut pending = self.pending.lock().await;
            offerings
                .into_iter()
                .filter(|id| pending.insert(*id))
                .count()
        };
        if added > 0 {
            tracing::debug!("Queued {} offering(s) for recheck", added);
            self.notify.notify_one();
        }
    }

    /// Take everything queued so far
    pub async fn drain(&self) -> Vec<OfferingId> {
        std::mem::take(&mut *self.pending.lock().await)
            .into_iter()
            .collect()
    }

    /// Number of queued offerings
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether nothing is queued
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }

    /// Wait until something is queued
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}
