//! Init command implementation

use std::io::Write;
use std::path::PathBuf;

use kccp_cache::CacheConfig;
use miette::{IntoDiagnostic, Result};
use tracing::info;

pub fn run_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CacheConfig::CONFIG_FILE);

    let mut default_config =
        serde_json::to_string_pretty(&CacheConfig::default()).into_diagnostic()?;
    default_config.push('\n');

    let mut options = std::fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    match options.open(&config_path) {
        Ok(mut file) => {
            file.write_all(default_config.as_bytes()).into_diagnostic()?;
            info!("Created {}", config_path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(miette::miette!(
            "Config file already exists. Use --force to overwrite."
        )),
        Err(e) => Err(e).into_diagnostic(),
    }
}
