//! Cache verification: on-disk sizes against manifest lengths.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{CacheConfig, CacheError, ManifestStore};

/// Maximum number of files checked at the same time.
///
/// Higher values risk running out of file descriptors on large caches.
pub const VERIFY_CONCURRENCY: usize = 32;

/// Result of checking a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// On-disk length matches the manifest.
    Valid,
    /// On-disk length differs from the manifest.
    Invalid { expected: u64, actual: u64 },
    /// The file is missing, unreadable or outside the cache root.
    Errored(String),
}

/// Counts reported by [`verify_cache`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Entries with a length, i.e. entries that were checked or attempted.
    pub total: usize,
    /// Entries whose file has the wrong length.
    pub invalid: usize,
    /// Entries whose file could be read (valid + invalid).
    pub checked: usize,
    /// Entries whose file could not be read.
    pub errored: usize,
    /// Entries dropped from the manifest.
    pub removed: usize,
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done verifying, found {} invalid files, {} files checked, manifest contains {} files, failed to check {} files (missing?)",
            self.invalid, self.checked, self.total, self.errored
        )?;
        if self.removed > 0 {
            write!(f, ", removed {} entries", self.removed)?;
        }
        Ok(())
    }
}

/// Checks the on-disk length of one file.
pub async fn check_file(path: &Path, expected: u64) -> VerifyOutcome {
    match file_length(path).await {
        Ok(actual) if actual == expected => VerifyOutcome::Valid,
        Ok(actual) => VerifyOutcome::Invalid { expected, actual },
        Err(e) => VerifyOutcome::Errored(e.to_string()),
    }
}

async fn file_length(path: &Path) -> io::Result<u64> {
    let file = tokio::fs::File::open(path).await?;
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(io::Error::other("not a regular file"));
    }
    Ok(metadata.len())
}

/// Verifies every manifest entry that has a length against its file.
///
/// With `delete_invalid`, entries that are invalid or could not be checked
/// are dropped from the manifest and their file is deleted. Deletion is
/// best-effort and never aborts the run.
pub async fn verify_cache(
    store: &mut ManifestStore,
    config: &CacheConfig,
    delete_invalid: bool,
) -> Result<VerifyReport, CacheError> {
    if !config.verify_cache {
        error!("verifyCache is not set in config! Aborted check!");
        return Err(CacheError::VerificationDisabled);
    }

    info!("Verifying cache... This might take a while");

    let checks: Vec<(String, Option<PathBuf>, u64)> = store
        .manifest()
        .iter()
        .filter_map(|(path, entry)| {
            entry
                .length
                .map(|length| (path.clone(), store.content_path(path), length))
        })
        .collect();

    let mut outcomes: Vec<(String, Option<PathBuf>, VerifyOutcome)> = stream::iter(checks)
        .map(|(path, file, expected)| async move {
            let outcome = match &file {
                Some(file) => check_file(file, expected).await,
                None => VerifyOutcome::Errored("path escapes the cache root".to_string()),
            };
            (path, file, outcome)
        })
        .buffer_unordered(VERIFY_CONCURRENCY)
        .collect()
        .await;
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut report = VerifyReport {
        total: outcomes.len(),
        ..VerifyReport::default()
    };

    for (path, file, outcome) in outcomes {
        match &outcome {
            VerifyOutcome::Valid => {
                report.checked += 1;
                continue;
            }
            VerifyOutcome::Invalid { expected, actual } => {
                error!("{} length doesn't match! {} != {}", path, actual, expected);
                report.checked += 1;
                report.invalid += 1;
            }
            VerifyOutcome::Errored(reason) => {
                debug!("Failed to check {}: {}", path, reason);
                report.errored += 1;
            }
        }

        if delete_invalid {
            if let Some(file) = file
                && let Err(e) = tokio::fs::remove_file(&file).await
                && e.kind() != io::ErrorKind::NotFound
            {
                warn!("Failed to delete {}: {}", file.display(), e);
            }
            store.remove(&path);
            report.removed += 1;
        }
    }

    if report.removed > 0 {
        store.force_save()?;
    }

    info!("{}", report);
    Ok(report)
}
