//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// kccp - keep a proxy content cache in sync across machines
#[derive(Parser)]
#[command(name = "kccp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (defaults to ./kccp.json when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache root, overriding the configured cacheLocation
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Summary output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every cached file's size against the manifest
    Verify {
        /// Delete invalid files and drop them from the manifest
        #[arg(long)]
        delete: bool,
    },

    /// Merge a bundle into the local cache
    Merge {
        /// Bundle to import
        bundle: PathBuf,
    },

    /// Export the changes since a baseline as a bundle
    Diff {
        /// Baseline manifest file or bundle (.zip)
        baseline: PathBuf,

        /// Bundle to write
        target: PathBuf,
    },

    /// Delete files flagged as invalidated
    Clear,

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
