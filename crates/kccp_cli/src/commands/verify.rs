//! Verify command implementation

use miette::{IntoDiagnostic, Result};

use crate::cli::Cli;
use crate::output::print_report;
use crate::utils::{create_tokio_runtime, load_config, open_store};

pub fn run_verify(cli: &Cli, delete_invalid: bool) -> Result<()> {
    let config = load_config(cli)?;
    let mut store = open_store(&config)?;

    let runtime = create_tokio_runtime()?;
    let report = runtime
        .block_on(kccp_cache::verify_cache(&mut store, &config, delete_invalid))
        .into_diagnostic()?;

    print_report(&report, cli.format)
}
