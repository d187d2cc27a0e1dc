//! Integration tests for CLI commands
//!
//! Each test works on a throwaway cache root and drives the binary
//! through its subcommands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const T1: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
const T2: &str = "Thu, 22 Oct 2015 07:28:00 GMT";

fn kccp_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kccp"))
}

/// Writes content files under `root` and a `cached.json` describing them.
fn write_cache(root: &Path, files: &[(&str, &[u8], &str, u64)]) {
    let mut manifest = serde_json::Map::new();
    for (path, content, last_modified, version) in files {
        let file = root.join(path.trim_start_matches('/'));
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, content).unwrap();
        manifest.insert(
            path.to_string(),
            serde_json::json!({
                "length": content.len(),
                "lastmodified": last_modified,
                "version": version,
            }),
        );
    }
    fs::create_dir_all(root).unwrap();
    fs::write(
        root.join("cached.json"),
        serde_json::to_vec_pretty(&manifest).unwrap(),
    )
    .unwrap();
}

fn read_manifest(root: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(root.join("cached.json")).unwrap()).unwrap()
}

mod init_command {
    use super::*;

    #[test]
    fn creates_new_config_file() {
        let temp_dir = TempDir::new().unwrap();

        kccp_cmd()
            .current_dir(temp_dir.path())
            .arg("init")
            .assert()
            .success()
            .stderr(predicate::str::contains("Created kccp.json"));

        let content = fs::read_to_string(temp_dir.path().join("kccp.json")).unwrap();
        assert!(content.contains("cacheLocation"));
        assert!(content.contains("verifyCache"));
    }

    #[test]
    fn fails_when_config_exists_without_force() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("kccp.json"), "{}").unwrap();

        kccp_cmd()
            .current_dir(temp_dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn overwrites_with_force() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("kccp.json");
        fs::write(&config_path, "{}").unwrap();

        kccp_cmd()
            .current_dir(temp_dir.path())
            .args(["init", "--force"])
            .assert()
            .success();

        assert!(fs::read_to_string(config_path).unwrap().contains("cacheLocation"));
    }
}

mod verify_command {
    use super::*;

    #[test]
    fn refuses_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        write_cache(&cache, &[("/a.bin", b"aaa", T1, 1)]);

        kccp_cmd()
            .current_dir(temp_dir.path())
            .arg("--cache-dir")
            .arg(&cache)
            .arg("verify")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("verifyCache is not set"));
    }

    #[test]
    fn reports_and_deletes_invalid_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        write_cache(
            &cache,
            &[("/good.bin", b"good", T1, 1), ("/bad.bin", b"bad", T1, 1)],
        );
        // Truncate one file behind the manifest's back.
        fs::write(cache.join("bad.bin"), b"b").unwrap();
        fs::write(
            temp_dir.path().join("kccp.json"),
            r#"{ "cacheLocation": "./cache/", "verifyCache": true, "port": 8080 }"#,
        )
        .unwrap();

        kccp_cmd()
            .current_dir(temp_dir.path())
            .args(["verify", "--delete"])
            .assert()
            .success()
            .stdout(predicate::str::contains("found 1 invalid files"));

        assert!(!cache.join("bad.bin").exists());
        assert!(cache.join("good.bin").exists());
        let manifest = read_manifest(&cache);
        assert!(manifest.get("/bad.bin").is_none());
        assert!(manifest.get("/good.bin").is_some());
    }

    #[test]
    fn prints_json_report() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        write_cache(&cache, &[("/a.bin", b"aaa", T1, 1)]);
        let config = temp_dir.path().join("conf.json");
        fs::write(&config, r#"{ "cacheLocation": "cache", "verifyCache": true }"#).unwrap();

        let output = kccp_cmd()
            .arg("--config")
            .arg(&config)
            .args(["--format", "json", "verify"])
            .output()
            .unwrap();

        assert!(output.status.success());
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["total"], 1);
        assert_eq!(report["invalid"], 0);
    }
}

mod diff_and_merge_commands {
    use super::*;

    #[test]
    fn moves_changes_between_caches() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let target = temp_dir.path().join("target");
        write_cache(
            &source,
            &[
                ("/kcs2/img/a.png", b"unchanged", T1, 1),
                ("/kcs2/js/main.js", b"new main", T2, 1),
                ("/kcs2/sound/b.mp3", b"brand new", T2, 1),
            ],
        );
        write_cache(
            &target,
            &[
                ("/kcs2/img/a.png", b"unchanged", T1, 1),
                ("/kcs2/js/main.js", b"old", T1, 1),
            ],
        );

        let bundle = temp_dir.path().join("diff.zip");
        kccp_cmd()
            .arg("--cache-dir")
            .arg(&source)
            .arg("diff")
            .arg(target.join("cached.json"))
            .arg(&bundle)
            .assert()
            .success()
            .stdout(predicate::str::contains("2 total changes, of which 1 new files"));
        assert!(bundle.exists());

        kccp_cmd()
            .arg("--cache-dir")
            .arg(&target)
            .arg("merge")
            .arg(&bundle)
            .assert()
            .success()
            .stdout(predicate::str::contains("Copied 2 files"));

        assert_eq!(
            fs::read(target.join("kcs2/js/main.js")).unwrap(),
            b"new main"
        );
        assert_eq!(
            fs::read(target.join("kcs2/sound/b.mp3")).unwrap(),
            b"brand new"
        );
        assert_eq!(read_manifest(&target), read_manifest(&source));
    }

    #[test]
    fn diff_of_missing_baseline_fails() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        write_cache(&cache, &[]);

        kccp_cmd()
            .arg("--cache-dir")
            .arg(&cache)
            .arg("diff")
            .arg(temp_dir.path().join("missing.json"))
            .arg(temp_dir.path().join("out.zip"))
            .assert()
            .code(1);
        assert!(!temp_dir.path().join("out.zip").exists());
    }
}

mod clear_command {
    use super::*;

    #[test]
    fn deletes_invalidated_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        write_cache(&cache, &[("/keep.bin", b"keep", T1, 1)]);
        fs::write(cache.join("stale.bin"), b"stale").unwrap();
        fs::write(
            cache.join("invalidated.json"),
            r#"["/stale.bin", "/missing.bin"]"#,
        )
        .unwrap();

        kccp_cmd()
            .arg("--cache-dir")
            .arg(&cache)
            .arg("clear")
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted 1 files"))
            .stderr(predicate::str::contains("as it could potentially cause issues"));

        assert!(!cache.join("stale.bin").exists());
        assert!(cache.join("keep.bin").exists());
    }
}
