//! CLI utility functions

use std::path::Path;

use kccp_cache::{CacheConfig, ManifestStore};
use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::cli::Cli;

pub fn create_tokio_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// Loads the configuration from `--config`, `./kccp.json` or defaults,
/// then applies `--cache-dir`.
pub fn load_config(cli: &Cli) -> Result<CacheConfig> {
    let mut config = if let Some(ref path) = cli.config {
        CacheConfig::from_file(path).into_diagnostic()?
    } else if Path::new(CacheConfig::CONFIG_FILE).exists() {
        CacheConfig::from_file(CacheConfig::CONFIG_FILE).into_diagnostic()?
    } else {
        debug!("No config file found, using defaults");
        CacheConfig::default()
    };

    if let Some(ref dir) = cli.cache_dir {
        config.cache_location = dir.clone();
    }

    Ok(config)
}

/// Opens the manifest store of the configured cache root.
pub fn open_store(config: &CacheConfig) -> Result<ManifestStore> {
    ManifestStore::open(config.cache_location()).into_diagnostic()
}
