// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the mediactl CLI
//!
//! These tests verify argument handling and error paths end-to-end using
//! the assert_cmd crate pattern. Hardware-backed tests are ignored by
//! default and need a media controller device.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

/// Helper to create a Command for the mediactl binary
fn mediactl_cmd() -> Command {
    Command::cargo_bin("mediactl").expect("mediactl binary built")
}

// =============================================================================
// Basic CLI Tests (No Hardware Required)
// =============================================================================

#[test]
fn test_cli_help() {
    mediactl_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Media Controller CLI"))
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("topology"))
        .stdout(predicate::str::contains("link"))
        .stdout(predicate::str::contains("controls"));
}

#[test]
fn test_cli_version() {
    mediactl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediactl"));
}

#[test]
fn test_cli_no_subcommand_fails() {
    mediactl_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_unknown_subcommand_fails() {
    mediactl_cmd().arg("bogus").assert().failure();
}

#[test]
fn test_link_requires_action() {
    // Selecting a link without --enable/--disable is an argument error.
    mediactl_cmd()
        .args(["link", "--id", "20"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--enable or --disable"));
}

#[test]
fn test_link_rejects_conflicting_actions() {
    mediactl_cmd()
        .args(["link", "--id", "20", "--enable", "--disable"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_link_source_requires_sink() {
    mediactl_cmd()
        .args(["link", "--source", "sensor:0", "--enable"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--sink"));
}

#[test]
fn test_controls_requires_entity() {
    mediactl_cmd()
        .arg("controls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--entity"));
}

#[test]
fn test_info_on_missing_device_fails() {
    mediactl_cmd()
        .args(["info", "--device", "/dev/nonexistent-media"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_topology_on_non_media_node_fails() {
    // /dev/null opens fine but rejects media ioctls.
    mediactl_cmd()
        .args(["topology", "--device", "/dev/null"])
        .assert()
        .failure();
}

#[test]
fn test_devices_on_empty_dir() {
    let tmp = tempfile::tempdir().unwrap();
    mediactl_cmd()
        .args(["devices", "--dev-dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No media controller devices"));
}

#[test]
fn test_devices_json_on_empty_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let output = mediactl_cmd()
        .args(["devices", "--json", "--dev-dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(parsed["devices"], serde_json::json!([]));
}

// =============================================================================
// Hardware Tests (Require a media controller device)
// =============================================================================

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_devices_lists_hardware() {
    mediactl_cmd()
        .arg("devices")
        .assert()
        .success()
        .stdout(predicate::str::contains("/dev/media"));
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_info_json_is_well_formed() {
    let output = mediactl_cmd()
        .args(["info", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert!(parsed["driver"].is_string());
    assert!(parsed["entities"].is_number());
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_topology_prints_entities() {
    mediactl_cmd()
        .arg("topology")
        .assert()
        .success()
        .stdout(predicate::str::contains("- entity"));
}
