//! Merging a bundle from another machine into the local cache.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::archive::BundleReader;
use crate::manifest::bundle_entry_name;
use crate::progress::Progress;
use crate::{CacheError, CacheManifest, ManifestStore, Resolution};

/// Counts reported by [`merge_cache`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Files extracted from the bundle.
    pub copied: usize,
    /// Entries whose version tag was updated without copying content.
    pub version_changed: usize,
    /// Entries kept because the local copy is newer.
    pub newer_locally: usize,
    /// Entries identical on both sides.
    pub same: usize,
    /// Entries without content stored as metadata only.
    pub metadata_only: usize,
    /// Entries missing from the bundle or with an unusable path.
    pub skipped: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished merging cache! Copied {} files, updated version tag of {} files. {} were newer locally, {} are the same, {} skipped.",
            self.copied, self.version_changed, self.newer_locally, self.same, self.skipped
        )?;
        if self.metadata_only > 0 {
            write!(f, " {} metadata-only entries.", self.metadata_only)?;
        }
        Ok(())
    }
}

/// Merges the bundle at `bundle_path` into `store`.
///
/// Paths are processed in ascending order. The store is saved once, also
/// when the merge fails partway; the bundle is closed either way.
pub async fn merge_cache(
    store: &mut ManifestStore,
    bundle_path: impl AsRef<Path>,
) -> Result<MergeReport, CacheError> {
    let bundle_path = bundle_path.as_ref();
    info!(
        "Merging {} into {}",
        bundle_path.display(),
        store.root().display()
    );

    let bundle = BundleReader::open(bundle_path).await.inspect_err(|e| {
        error!("An error occurred while reading {}: {}", bundle_path.display(), e);
    })?;
    let result = merge_bundle(store, &bundle).await;
    bundle.close().await;

    match result {
        Ok(report) => {
            info!("{}", report);
            Ok(report)
        }
        Err(e) => {
            error!("Failed to merge {}: {}", bundle_path.display(), e);
            Err(e)
        }
    }
}

async fn merge_bundle(
    store: &mut ManifestStore,
    bundle: &BundleReader,
) -> Result<MergeReport, CacheError> {
    let located = bundle.manifest().await?;
    info!("Found {}", located.name);

    let foreign = located.parse()?;
    let mut report = MergeReport::default();

    let result = merge_entries(store, bundle, &foreign, located.base_prefix(), &mut report).await;
    if let Err(e) = result {
        // Paths merged before the failure already have their new content on disk.
        if store.is_dirty()
            && let Err(save_err) = store.force_save()
        {
            warn!("Failed to save partial merge: {}", save_err);
        }
        return Err(e);
    }

    store.force_save()?;
    Ok(report)
}

async fn merge_entries(
    store: &mut ManifestStore,
    bundle: &BundleReader,
    foreign: &CacheManifest,
    base_prefix: &str,
    report: &mut MergeReport,
) -> Result<(), CacheError> {
    let mut progress = Progress::new("cache merge", foreign.len());
    let mut indexed = false;

    for (path, new_entry) in foreign {
        progress.tick();

        let Some(target) = store.content_path(path) else {
            warn!("Skipping {}: path escapes the cache root", path);
            report.skipped += 1;
            continue;
        };

        let resolution = if !new_entry.has_content()
            || tokio::fs::try_exists(&target).await.unwrap_or(false)
        {
            Resolution::classify(store.get(path), new_entry)
        } else {
            Resolution::ContentChanged
        };

        match resolution {
            Resolution::LocallyNewer => {
                report.newer_locally += 1;
                continue;
            }
            Resolution::Unchanged => {
                report.same += 1;
                continue;
            }
            Resolution::VersionChanged => {
                store.insert(path.clone(), new_entry.clone());
                report.version_changed += 1;
                continue;
            }
            Resolution::ContentChanged => {}
        }

        if !new_entry.has_content() {
            store.insert(path.clone(), new_entry.clone());
            report.metadata_only += 1;
            continue;
        }

        if !indexed {
            bundle.ready().await?;
            info!("Bundle loaded, extracting missing files...");
            indexed = true;
        }

        let source = bundle_entry_name(base_prefix, path);
        if !bundle.contains(&source) {
            warn!("File {} is missing in bundle", source);
            report.skipped += 1;
            continue;
        }

        if let Err(e) = tokio::fs::remove_file(&target).await
            && e.kind() != io::ErrorKind::NotFound
        {
            return Err(e.into());
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        bundle.extract(&source, &target).await?;
        debug!("Extracted {} to {}", source, target.display());

        store.insert(path.clone(), new_entry.clone());
        report.copied += 1;
    }

    Ok(())
}
