//! Binary-level checks.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn kiln() -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_schema_prints_config_fields() {
    kiln()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("debounceMs"))
        .stdout(predicate::str::contains("pagesDir"));
}

#[test]
fn test_develop_rejects_missing_project() {
    kiln()
        .args(["develop", "--cwd", "/definitely/not/a/site"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_develop_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("kiln.config.json"), r#"{ "port": 0 }"#).unwrap();

    kiln()
        .arg("develop")
        .arg("--cwd")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    kiln()
        .args(["--verbose", "--quiet", "schema"])
        .assert()
        .failure();
}
