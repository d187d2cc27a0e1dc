//! Manifest store for the local cache.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::manifest::{self, MANIFEST_FILE};
use crate::{CacheEntry, CacheError, CacheManifest};

/// File holding the invalidated paths, next to the manifest.
pub const INVALIDATED_FILE: &str = "invalidated.json";

/// Minimum time between two writes done by [`ManifestStore::save`].
pub const AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(60);

/// Owns the manifest of a cache root and its persistence.
///
/// Created once at startup with [`ManifestStore::open`] and handed to each
/// operation by reference. Mutations stay in memory until
/// [`ManifestStore::save`] or [`ManifestStore::force_save`] is called.
pub struct ManifestStore {
    /// Root directory of the cached content.
    root: PathBuf,
    /// Metadata of every cached path.
    manifest: CacheManifest,
    /// Paths flagged as untrustworthy.
    invalidated: BTreeSet<String>,
    /// Whether there are unsaved changes.
    dirty: bool,
    /// When the store was last written.
    last_save: Option<Instant>,
}

impl ManifestStore {
    /// Creates an empty store rooted at `root` without touching the disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: CacheManifest::new(),
            invalidated: BTreeSet::new(),
            dirty: false,
            last_save: None,
        }
    }

    /// Loads the store persisted under `root`.
    ///
    /// Missing files are treated as an empty cache.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let mut store = Self::new(root);

        let manifest_file = store.manifest_file();
        if manifest_file.exists() {
            store.manifest = CacheManifest::from_file(&manifest_file)?;
            info!("Loaded {} cache entries", store.manifest.len());
        } else {
            debug!("No manifest found at {}", manifest_file.display());
        }

        let invalidated_file = store.root.join(INVALIDATED_FILE);
        if invalidated_file.exists() {
            let content = fs::read(&invalidated_file)?;
            store.invalidated = serde_json::from_slice(&content).map_err(|e| {
                CacheError::corrupted(format!("{}: {}", invalidated_file.display(), e))
            })?;
            debug!("Loaded {} invalidated paths", store.invalidated.len());
        }

        Ok(store)
    }

    /// Returns the cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the manifest file location.
    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Resolves a manifest path to its file under the cache root.
    pub fn content_path(&self, path: &str) -> Option<PathBuf> {
        manifest::resolve_path(&self.root, path)
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    pub fn get(&self, path: &str) -> Option<&CacheEntry> {
        self.manifest.get(path)
    }

    /// Stores the metadata of a path.
    pub fn insert(&mut self, path: impl Into<String>, entry: CacheEntry) {
        self.manifest.insert(path, entry);
        self.dirty = true;
    }

    /// Removes a path from the manifest.
    pub fn remove(&mut self, path: &str) -> Option<CacheEntry> {
        let removed = self.manifest.remove(path);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Returns the paths flagged as untrustworthy, in ascending order.
    pub fn invalidated(&self) -> &BTreeSet<String> {
        &self.invalidated
    }

    /// Flags a path as untrustworthy and drops its metadata.
    ///
    /// The file itself is left for [`crate::clear_invalidated`].
    pub fn invalidate(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.manifest.remove(&path);
        self.invalidated.insert(path);
        self.dirty = true;
    }

    /// Returns true if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    /// Returns true if the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Writes the store if it changed and the last write is old enough.
    ///
    /// Returns whether anything was written.
    pub fn save(&mut self) -> Result<bool, CacheError> {
        if !self.dirty {
            return Ok(false);
        }
        if let Some(last) = self.last_save
            && last.elapsed() < AUTO_SAVE_INTERVAL
        {
            debug!("Skipping save, last write was {:?} ago", last.elapsed());
            return Ok(false);
        }

        self.force_save()?;
        Ok(true)
    }

    /// Writes the store to disk immediately.
    pub fn force_save(&mut self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;

        write_atomic(&self.manifest_file(), &self.manifest.to_vec()?)?;
        write_atomic(
            &self.root.join(INVALIDATED_FILE),
            &serde_json::to_vec(&self.invalidated)?,
        )?;

        self.dirty = false;
        self.last_save = Some(Instant::now());

        info!(
            "Saved {} cache entries to {}",
            self.manifest.len(),
            self.manifest_file().display()
        );

        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
