//! Exporting the difference between the local cache and a baseline.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{BundleReader, BundleWriter};
use crate::manifest::strip_leading_separator;
use crate::progress::Progress;
use crate::{CacheError, CacheManifest, ManifestStore, Resolution};

/// Counts reported by [`create_diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// Entries exported with content, new ones included.
    pub changed: usize,
    /// Content entries absent from the baseline.
    pub new_files: usize,
    /// Entries exported as a metadata record only because the version changed.
    pub version_changed: usize,
    /// Entries identical in the baseline.
    pub same: usize,
    /// Entries without content exported as a metadata record only.
    pub metadata_only: usize,
    /// Entries the baseline claims are newer than the local copy.
    pub newer_in_baseline: usize,
    /// Entries with a path outside the cache root, not exported.
    pub skipped: usize,
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished creating diff! {} total changes, of which {} new files. {} changed version. {} are exactly the same. {} are newer in old cache?!",
            self.changed, self.new_files, self.version_changed, self.same, self.newer_in_baseline
        )?;
        if self.metadata_only > 0 {
            write!(f, " {} metadata-only entries.", self.metadata_only)?;
        }
        if self.skipped > 0 {
            write!(f, " {} skipped.", self.skipped)?;
        }
        Ok(())
    }
}

/// Returns true if `path` names a bundle rather than a plain manifest.
pub fn is_bundle(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Loads a baseline manifest from a bundle or a plain manifest file.
pub async fn load_baseline(source: &Path) -> Result<CacheManifest, CacheError> {
    if !is_bundle(source) {
        let bytes = tokio::fs::read(source).await?;
        return CacheManifest::from_slice(&bytes)
            .map_err(|e| CacheError::corrupted(format!("{}: {}", source.display(), e)));
    }

    let bundle = BundleReader::open(source).await?;
    let located = bundle.manifest().await;
    bundle.close().await;

    let located = located?;
    info!("Found {}", located.name);
    located.parse()
}

/// Writes a bundle to `target` holding everything in `store` that
/// `baseline` lacks or has older.
///
/// Content entries are stored under their path without the leading
/// separator, next to a `cached.json` with the exported metadata.
pub async fn create_diff(
    store: &ManifestStore,
    baseline: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> Result<DiffReport, CacheError> {
    let baseline = baseline.as_ref();
    let target = target.as_ref();
    info!("{} -> {}", baseline.display(), target.display());

    let previous = load_baseline(baseline).await.inspect_err(|e| {
        warn!("Failed to load baseline {}: {}", baseline.display(), e);
    })?;

    let mut output = CacheManifest::new();
    let mut writer = BundleWriter::new();
    let mut report = DiffReport::default();
    let mut progress = Progress::new("diff", store.len());

    for (path, current) in store.manifest() {
        progress.tick();

        let Some(source) = store.content_path(path) else {
            warn!("Skipping {}: path escapes the cache root", path);
            report.skipped += 1;
            continue;
        };

        let old = previous.get(path);
        match Resolution::classify(old, current) {
            Resolution::LocallyNewer => {
                report.newer_in_baseline += 1;
                continue;
            }
            Resolution::Unchanged => {
                report.same += 1;
                continue;
            }
            Resolution::VersionChanged => {
                output.insert(path.clone(), current.clone());
                report.version_changed += 1;
                continue;
            }
            Resolution::ContentChanged => {}
        }

        if !current.has_content() {
            output.insert(path.clone(), current.clone());
            report.metadata_only += 1;
            continue;
        }

        if old.is_none() {
            report.new_files += 1;
        }
        writer.add_file(strip_leading_separator(path), source);
        output.insert(path.clone(), current.clone());
        report.changed += 1;
    }

    writer.set_manifest(&output)?;

    info!("Saving...");
    let target_path = target.to_path_buf();
    tokio::task::spawn_blocking(move || writer.write(&target_path))
        .await?
        .inspect_err(|e| warn!("Failed to write {}: {}", target.display(), e))?;

    info!("{}", report);
    Ok(report)
}
