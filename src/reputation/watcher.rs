//! Dataset file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::reputation::loader::load_dataset;
use crate::reputation::ReputationHandle;

/// Watches the reputation dataset and swaps in a fresh store on change.
pub struct DatasetWatcher {
    path: PathBuf,
    handle: ReputationHandle,
}

impl DatasetWatcher {
    pub fn new(path: &Path, handle: ReputationHandle) -> Self {
        Self {
            path: path.to_path_buf(),
            handle,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let handle = self.handle.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Reputation dataset change detected, reloading");
                        reload(&path, &handle);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Reputation watcher started");
        Ok(watcher)
    }
}

/// Load the dataset and publish it. On failure the current store stays.
fn reload(path: &Path, handle: &ReputationHandle) -> bool {
    match load_dataset(path) {
        Ok(store) => {
            handle.publish(store);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload reputation dataset, keeping current store");
            false
        }
    }
}
