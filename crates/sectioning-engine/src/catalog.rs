//! Shared accessor for the current catalog snapshot.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use sectioning_entity::catalog::CatalogSnapshot;

use crate::lock::Lock;

/// Holds the current [`CatalogSnapshot`].
///
/// Readers clone the `Arc` and keep working on that snapshot; a reload
/// swaps the pointer while holding the global write lock.
#[derive(Debug)]
pub struct Catalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl Catalog {
    /// Creates an accessor over an initial snapshot.
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the current snapshot.
    pub async fn current(&self) -> Arc<CatalogSnapshot> {
        self.current.read().await.clone()
    }

    /// Replaces the snapshot, returning the previous one.
    ///
    /// `exclusive` must be the global write lock.
    pub async fn replace(&self, exclusive: &Lock, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        debug_assert!(exclusive.is_exclusive());
        let mut current = self.current.write().await;
        let previous = std::mem::replace(&mut *current, Arc::new(snapshot));
        info!(
            sections = current.section_count(),
            reason = %exclusive.reason(),
            "Catalog snapshot replaced"
        );
        previous
    }
}
