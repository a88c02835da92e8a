//! Reputation subsystem.
//!
//! # Data Flow
//! ```text
//! dataset file (asn,organization[,category])
//!     → loader.rs (parse rows, fail open to empty)
//!     → store.rs (ReputationStore, immutable)
//!     → ReputationHandle (ArcSwap, read lock-free by every request)
//!
//! On file change (optional):
//!     watcher.rs detects change
//!     → loader.rs loads new dataset
//!     → atomic swap of Arc<ReputationStore>
//! ```
//!
//! # Design Decisions
//! - Stores are never mutated after construction; reload publishes a new one
//! - A failed load or reload never breaks the service
//! - Passed explicitly to the decision engine, no global state

pub mod loader;
pub mod store;
pub mod watcher;

use arc_swap::ArcSwap;
use std::sync::Arc;

pub use loader::{load_dataset, load_or_empty, parse_dataset, ReputationError};
pub use store::{ReputationEntry, ReputationMatch, ReputationStore};
pub use watcher::DatasetWatcher;

/// Shared, atomically replaceable reference to the current store.
#[derive(Debug, Clone)]
pub struct ReputationHandle {
    inner: Arc<ArcSwap<ReputationStore>>,
}

impl ReputationHandle {
    pub fn new(store: ReputationStore) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(store)),
        }
    }

    /// The store as of now. In-flight readers keep the snapshot they loaded.
    pub fn current(&self) -> Arc<ReputationStore> {
        self.inner.load_full()
    }

    /// Replace the store for all subsequent readers.
    pub fn publish(&self, store: ReputationStore) {
        let entries = store.len();
        self.inner.store(Arc::new(store));
        tracing::info!(entries, "Reputation store published");
    }
}

impl Default for ReputationHandle {
    fn default() -> Self {
        Self::new(ReputationStore::empty())
    }
}
