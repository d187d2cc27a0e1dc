//! Integration tests for CLI behavior
//!
//! These tests verify the external behavior of the kccp binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn kccp_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kccp"))
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        kccp_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("merge"))
            .stdout(predicate::str::contains("diff"));
    }

    #[test]
    fn shows_version_with_flag() {
        kccp_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn requires_a_subcommand() {
        kccp_cmd().assert().failure();
    }
}

mod argument_errors {
    use super::*;

    #[test]
    fn merge_requires_bundle_argument() {
        kccp_cmd().arg("merge").assert().failure();
    }

    #[test]
    fn diff_requires_both_paths() {
        kccp_cmd().args(["diff", "old.json"]).assert().failure();
    }

    #[test]
    fn rejects_unknown_format() {
        kccp_cmd()
            .args(["--format", "xml", "clear"])
            .assert()
            .failure();
    }

    #[test]
    fn merge_of_missing_bundle_fails() {
        let temp_dir = tempfile::tempdir().unwrap();

        kccp_cmd()
            .current_dir(temp_dir.path())
            .args(["merge", "does-not-exist.zip"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Bundle not found"));
    }
}
