//! Merge command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use crate::cli::Cli;
use crate::output::print_report;
use crate::utils::{create_tokio_runtime, load_config, open_store};

pub fn run_merge(cli: &Cli, bundle: &Path) -> Result<()> {
    if !bundle.is_file() {
        return Err(miette::miette!("Bundle not found: {}", bundle.display()));
    }

    let config = load_config(cli)?;
    let mut store = open_store(&config)?;

    let runtime = create_tokio_runtime()?;
    let report = runtime
        .block_on(kccp_cache::merge_cache(&mut store, bundle))
        .into_diagnostic()?;

    print_report(&report, cli.format)
}
