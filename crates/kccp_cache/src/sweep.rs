//! Removal of files the store has flagged as invalidated.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::ManifestStore;

/// Counts reported by [`clear_invalidated`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Files deleted.
    pub deleted: usize,
    /// Files that exist but could not be deleted.
    pub failed: usize,
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished clearing invalidated files! Deleted {} files, failed to delete {}.",
            self.deleted, self.failed
        )
    }
}

/// Deletes the on-disk file of every invalidated path.
///
/// The manifest is not touched.
pub async fn clear_invalidated(store: &ManifestStore) -> SweepReport {
    let mut report = SweepReport::default();

    for path in store.invalidated() {
        let Some(file) = store.content_path(path) else {
            warn!("Skipping {}: path escapes the cache root", path);
            continue;
        };

        if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
            continue;
        }

        match tokio::fs::remove_file(&file).await {
            Ok(()) => {
                info!(
                    "Deleted {} - as it could potentially cause issues",
                    file.display()
                );
                report.deleted += 1;
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", file.display(), e);
                report.failed += 1;
            }
        }
    }

    info!("{}", report);
    report
}
