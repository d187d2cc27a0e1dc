//! Cache configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CacheError;

/// Settings this crate reads from the proxy configuration.
///
/// The proxy shares its config file with other components, so unknown
/// keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Root directory of the cached content.
    #[serde(default = "default_cache_location")]
    pub cache_location: PathBuf,

    /// Whether cache verification may run.
    #[serde(default)]
    pub verify_cache: bool,
}

fn default_cache_location() -> PathBuf {
    PathBuf::from("./cache/")
}

impl CacheConfig {
    /// Config file looked up in the working directory when none is given.
    pub const CONFIG_FILE: &'static str = "kccp.json";

    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            cache_location: default_cache_location(),
            verify_cache: false,
        }
    }

    /// Loads configuration from a file.
    ///
    /// A relative `cacheLocation` is resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CacheError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut config = Self::from_json(&content)?;

        if config.cache_location.is_relative()
            && let Some(parent) = path.parent()
        {
            config.cache_location = parent.join(&config.cache_location);
        }

        Ok(config)
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json).map_err(|e| CacheError::config(format!("Invalid config: {}", e)))
    }

    /// Returns the cache root.
    pub fn cache_location(&self) -> &Path {
        &self.cache_location
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}
