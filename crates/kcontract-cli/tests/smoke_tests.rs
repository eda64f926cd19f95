//! Smoke tests for the kcontract CLI
//!
//! These tests run the built binary against the scenario catalog.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the kcontract binary
fn kcontract() -> Command {
    let mut cmd = Command::cargo_bin("kcontract").expect("kcontract binary should exist");
    cmd.env_remove("RUST_LOG").env_remove("KCONTRACT_CONFIG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    kcontract()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    kcontract()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("explore"))
        .stdout(predicate::str::contains("fuzz"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn test_no_args_shows_help() {
    kcontract().assert().failure();
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn test_list() {
    kcontract()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("gendisk_safe"))
        .stdout(predicate::str::contains("usb_probe_swallows_error"));
}

#[test]
fn test_list_json() {
    let output = kcontract().args(["list", "--format", "json"]).output().unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(entries.as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn test_explore_safe_scenario() {
    kcontract()
        .args(["--color", "never", "explore", "gendisk_safe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gendisk_safe: SAFE"));
}

#[test]
fn test_explore_unsafe_scenario_reports_violation() {
    kcontract()
        .args(["--color", "never", "explore", "gendisk_double_add"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UNSAFE"))
        .stdout(predicate::str::contains(
            "linux:gendisk::use before allocation",
        ));
}

#[test]
fn test_explore_all() {
    kcontract()
        .args(["-q", "explore", "--all"])
        .assert()
        .success();
}

#[test]
fn test_explore_truncated_verdict_fails() {
    kcontract()
        .args(["-q", "explore", "queue_leak", "--max-paths", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Verdict mismatch"));
}

#[test]
fn test_explore_truncated_safe_verdict_fails() {
    kcontract()
        .args(["-q", "explore", "sysfs_safe", "--max-paths", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Verdict mismatch"));
}

#[test]
fn test_explore_zero_path_budget_rejected() {
    kcontract()
        .args(["-q", "explore", "sysfs_safe", "--max-paths", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_paths must be positive"));
}

#[test]
fn test_explore_unknown_scenario() {
    kcontract()
        .args(["explore", "no_such_driver"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown scenario"));
}

#[test]
fn test_fuzz_json() {
    let output = kcontract()
        .args(["-q", "fuzz", "usb_probe_swallows_error", "-s", "3", "-r", "20", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["paths"].as_array().map(Vec::len), Some(20));
    assert_eq!(report["strategy"]["kind"], "seeded");
}

#[test]
fn test_replay_counterexample() {
    kcontract()
        .args([
            "replay",
            "usb_probe_swallows_error",
            "--script",
            "1u,0,-12",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("linux:usb:register::wrong return value"));
}

#[test]
fn test_replay_help_names_cpu_count() {
    kcontract()
        .args(["replay", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CPU count"));
}

#[test]
fn test_replay_without_cpu_count_is_infeasible() {
    kcontract()
        .args(["replay", "sysfs_leak", "--script", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("outcome: Infeasible"))
        .stdout(predicate::str::contains("nr_cpu_ids > 0"));
}

#[test]
fn test_replay_bad_script() {
    kcontract()
        .args(["replay", "gendisk_safe", "--script", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid choice script"));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_defaults() {
    kcontract()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_paths: 4096"));
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("harness.yaml");
    fs::write(&path, "fuzz:\n  runs: 7\n").unwrap();

    kcontract()
        .args(["--config", path.to_str().unwrap(), "config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"runs\": 7"));
}

#[test]
fn test_config_bad_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("harness.toml");
    fs::write(&path, "").unwrap();

    kcontract()
        .args(["--config", path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported config format"));
}
