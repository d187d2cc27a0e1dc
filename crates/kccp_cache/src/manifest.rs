//! The cache manifest: relative path to entry metadata.
//!
//! Keys are paths relative to the cache root and always start with `/`.
//! The manifest is kept in a `BTreeMap`, so every iteration walks keys in
//! ascending order and progress output is deterministic.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CacheEntry, CacheError};

/// File name of the manifest, in the cache root and inside bundles.
pub const MANIFEST_FILE: &str = "cached.json";

/// Mapping from relative cache path to entry metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheManifest {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a manifest from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::corrupted(e.to_string()))
    }

    /// Reads a manifest from a plain JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
            .map_err(|e| CacheError::corrupted(format!("{}: {}", path.display(), e)))
    }

    /// Encodes the manifest as JSON.
    pub fn to_vec(&self) -> Result<Vec<u8>, CacheError> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    pub fn get(&self, path: &str) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Inserts or replaces an entry, returning the previous one.
    pub fn insert(&mut self, path: impl Into<String>, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(path.into(), entry)
    }

    pub fn remove(&mut self, path: &str) -> Option<CacheEntry> {
        self.entries.remove(path)
    }

    /// Iterates entries in ascending path order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, CacheEntry> {
        self.entries.iter()
    }

    /// Iterates paths in ascending order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a CacheManifest {
    type Item = (&'a String, &'a CacheEntry);
    type IntoIter = btree_map::Iter<'a, String, CacheEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, CacheEntry)> for CacheManifest {
    fn from_iter<I: IntoIterator<Item = (String, CacheEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Strips the single leading separator of a manifest path.
pub fn strip_leading_separator(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Name of a content entry inside a bundle whose manifest sits at `base_prefix`.
pub fn bundle_entry_name(base_prefix: &str, path: &str) -> String {
    format!("{}{}", base_prefix, strip_leading_separator(path))
}

/// Resolves a manifest path to a file under `root`.
///
/// Returns `None` unless every component is a plain name, so a manifest
/// from another machine can never address files outside the cache.
pub fn resolve_path(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(strip_leading_separator(path));
    let mut components = relative.components().peekable();
    components.peek()?;

    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(relative))
    } else {
        None
    }
}
