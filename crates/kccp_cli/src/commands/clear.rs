//! Clear command implementation

use miette::Result;

use crate::cli::Cli;
use crate::output::print_report;
use crate::utils::{create_tokio_runtime, load_config, open_store};

pub fn run_clear(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(&config)?;

    let runtime = create_tokio_runtime()?;
    let report = runtime.block_on(kccp_cache::clear_invalidated(&store));

    print_report(&report, cli.format)
}
