//! Subcommand implementations

mod clear;
mod diff;
mod init;
mod merge;
mod verify;

pub use clear::run_clear;
pub use diff::run_diff;
pub use init::run_init;
pub use merge::run_merge;
pub use verify::run_verify;
