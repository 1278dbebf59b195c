//! CLI integration tests for batch-nfpm.
//!
//! These cover everything that happens before the first project is
//! processed: argument parsing, config loading and the preflight check.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the batch-nfpm binary command, isolated from the caller's env.
fn batch_nfpm() -> Command {
    let mut cmd = Command::cargo_bin("batch-nfpm").unwrap();
    for var in [
        "NFPM_FORCE",
        "NFPM_CONFIG",
        "NFPM_ARTIFACTS_PATH",
        "NFPM_CLONE_PATH",
        "NFPM_PACKAGE_REPOSITORY",
        "NFPM_BINARY",
        "NFPM_VERBOSE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, contents: &str) -> String {
    let path = dir.join("batch-nfpm.toml");
    fs::write(&path, contents).unwrap();
    path.display().to_string()
}

const VALID: &str = r#"
[builds]
artifacts_path = "artifacts"
clone_path = "clones"
nfpm_config = "nfpm"

[[builds.build_configurations]]
owner = "prometheus"
project = "node_exporter"

[[builds.build_configurations.buildsteps]]
arch = "amd64"
buildsteps = ["make build"]
"#;

// ============================================================================
// arguments
// ============================================================================

#[test]
fn test_help_lists_flags() {
    batch_nfpm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--artifacts-path"))
        .stdout(predicate::str::contains("--clone-path"))
        .stdout(predicate::str::contains("--package-repository"))
        .stdout(predicate::str::contains("--nfpm"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    batch_nfpm().arg("--no-such-flag").assert().failure();
}

// ============================================================================
// config loading
// ============================================================================

#[test]
fn test_missing_config_file() {
    let tmp = TempDir::new().unwrap();

    batch_nfpm()
        .args(["-c", "does-not-exist.toml"])
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn test_invalid_toml() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "[builds\nowner = ");

    batch_nfpm()
        .args(["-c", &config])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn test_config_without_projects() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        "[builds]\nartifacts_path = \"a\"\nclone_path = \"c\"\nnfpm_config = \"n\"\n",
    );

    batch_nfpm()
        .args(["-c", &config])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no build configurations"));
}

#[test]
fn test_unknown_hoster() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        &VALID.replace(
            "project = \"node_exporter\"",
            "project = \"node_exporter\"\nhoster = \"bitbucket\"",
        ),
    );

    batch_nfpm()
        .args(["-c", &config])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown hoster `bitbucket`"));
}

#[test]
fn test_config_from_env() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "not toml at all [");

    batch_nfpm()
        .env("NFPM_CONFIG", &config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(config.as_str()));
}

// ============================================================================
// preflight
// ============================================================================

#[test]
fn test_missing_packaging_tool() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), VALID);

    batch_nfpm()
        .args(["-c", &config, "--nfpm", "batch-nfpm-missing-packager"])
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("batch-nfpm-missing-packager"))
        .stderr(predicate::str::contains("not found"));

    // nothing is created before preflight passes
    assert!(!tmp.path().join("artifacts").exists());
    assert!(!tmp.path().join("clones").exists());
}
