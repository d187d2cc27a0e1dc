//! Report output

use std::fmt::Display;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Prints an operation's summary to stdout.
pub fn print_report<R: Display + Serialize>(report: &R, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).into_diagnostic()?;
            println!("{json}");
        }
    }
    Ok(())
}
