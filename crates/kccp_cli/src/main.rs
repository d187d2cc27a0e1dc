//! kccp CLI
//!
//! Maintenance commands for the caching proxy's content cache.

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use commands::{run_clear, run_diff, run_init, run_merge, run_verify};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Verify { delete } => run_verify(cli, *delete),
        Commands::Merge { bundle } => run_merge(cli, bundle),
        Commands::Diff { baseline, target } => run_diff(cli, baseline, target),
        Commands::Clear => run_clear(cli),
        Commands::Init { force } => run_init(*force),
    }
}
