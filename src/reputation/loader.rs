//! Reputation dataset loading.
//!
//! Format: one `asn,organization[,category]` row per line. Blank lines and
//! `#` comments are skipped, as is a header row whose first field is `asn`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::reputation::store::{ReputationEntry, ReputationStore};

/// Error type for dataset loading.
#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("failed to read reputation dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse dataset text into a store. Malformed rows are skipped with a
/// warning; they never fail the whole load.
pub fn parse_dataset(content: &str) -> ReputationStore {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.splitn(3, ',').map(|f| f.trim().trim_matches('"'));
        let asn = fields.next().unwrap_or("");
        let organization = fields.next().unwrap_or("");
        let category = fields.next();

        if index == 0 && asn.eq_ignore_ascii_case("asn") {
            continue;
        }

        match ReputationEntry::new(asn, organization, category) {
            Some(entry) => entries.push(entry),
            None => {
                skipped += 1;
                tracing::warn!(line = index + 1, "Skipping reputation row without ASN or organization");
            }
        }
    }

    let store = ReputationStore::from_entries(entries);
    tracing::debug!(entries = store.len(), skipped, "Reputation dataset parsed");
    store
}

/// Read and parse a dataset file.
pub fn load_dataset(path: &Path) -> Result<ReputationStore, ReputationError> {
    let content = fs::read_to_string(path).map_err(|source| ReputationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_dataset(&content))
}

/// Load a dataset, failing open to an empty store.
pub fn load_or_empty(path: Option<&Path>) -> ReputationStore {
    let Some(path) = path else {
        tracing::info!("No reputation dataset configured, store is empty");
        return ReputationStore::empty();
    };

    match load_dataset(path) {
        Ok(store) => {
            tracing::info!(
                path = ?path,
                entries = store.len(),
                categories = ?store.categories(),
                "Reputation dataset loaded"
            );
            store
        }
        Err(e) => {
            tracing::error!(error = %e, "Reputation dataset failed to load, continuing with empty store");
            ReputationStore::empty()
        }
    }
}
