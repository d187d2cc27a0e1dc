//! Diff command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use crate::cli::Cli;
use crate::output::print_report;
use crate::utils::{create_tokio_runtime, load_config, open_store};

pub fn run_diff(cli: &Cli, baseline: &Path, target: &Path) -> Result<()> {
    if !baseline.is_file() {
        return Err(miette::miette!("Baseline not found: {}", baseline.display()));
    }

    let config = load_config(cli)?;
    let store = open_store(&config)?;

    let runtime = create_tokio_runtime()?;
    let report = runtime
        .block_on(kccp_cache::create_diff(&store, baseline, target))
        .into_diagnostic()?;

    print_report(&report, cli.format)
}
