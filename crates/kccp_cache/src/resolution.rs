//! Conflict resolution between two snapshots of the same cache entry.

use crate::CacheEntry;

/// How a candidate entry relates to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The existing entry has a strictly later timestamp; keep it.
    LocallyNewer,
    /// Length, timestamp and version all match.
    Unchanged,
    /// Only the version differs; metadata moves, content does not.
    VersionChanged,
    /// Content has to be transferred.
    ContentChanged,
}

impl Resolution {
    /// Classifies `new` against `old`.
    ///
    /// When `old` is `None` the path is unknown on the existing side and
    /// always needs its content.
    pub fn classify(old: Option<&CacheEntry>, new: &CacheEntry) -> Self {
        let Some(old) = old else {
            return Self::ContentChanged;
        };

        if old.is_newer_than(new) {
            return Self::LocallyNewer;
        }

        if old.length == new.length && old.last_modified == new.last_modified {
            if old.version == new.version {
                Self::Unchanged
            } else {
                Self::VersionChanged
            }
        } else {
            Self::ContentChanged
        }
    }
}
