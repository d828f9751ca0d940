//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

mod common;

use common::{dash_service, fixtures_dir, service_list};
use dvbi_validator::namespaces::SL_2023;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn dvbi_validate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dvbi-validate"))
}

fn fixture_path(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(dvbi_validate_bin())
        .args(args)
        .output()
        .expect("Failed to execute command")
}

// ============================================================================
// Service List Command Tests
// ============================================================================

#[test]
fn test_cli_sl_valid_document() {
    let config = fixture_path("reference.toml");
    let document = fixture_path("service_list_valid.xml");
    let output = run(&["--config", &config, "sl", &document]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "valid list should succeed: {}", stdout);
    assert!(stdout.contains("Document is valid"), "should report validity");
    assert!(stdout.contains("0 errors"), "should show error count");
}

#[test]
fn test_cli_sl_invalid_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("duplicate.xml");
    let body = format!(
        "{}\n{}",
        dash_service("tag:example.com,2024:one", ""),
        dash_service("tag:example.com,2024:one", "")
    );
    std::fs::write(&path, service_list(SL_2023, &body)).unwrap();

    let output = run(&["sl", path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "invalid list should exit with 1");
    assert!(stdout.contains("Document is invalid"), "should report invalidity");
    assert!(stdout.contains("duplicate identifier"), "should show per-category counts");
}

#[test]
fn test_cli_sl_json_output() {
    let document = fixture_path("service_list_valid.xml");
    let output = run(&["sl", "--json", &document]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "sl --json should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert!(json["findings"].as_array().map_or(false, |f| f.is_empty()));
    assert!(json["descriptions"]["SL100"].is_string());
}

#[test]
fn test_cli_markup_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("names.xml");
    let xml = service_list(
        SL_2023,
        &dash_service(
            "tag:example.com,2024:one",
            "    <ContentGuideSourceRef>missing</ContentGuideSourceRef>",
        ),
    );
    std::fs::write(&path, &xml).unwrap();

    let output = run(&["--markup", "sl", path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout.lines().count(), xml.lines().count());
    assert!(stdout.contains("class=\"error\""), "should attach the finding");
    assert!(stdout.contains("&lt;ServiceList"), "should escape the source");
}

#[test]
fn test_cli_missing_file() {
    let output = run(&["sl", "/nonexistent/list.xml"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"), "should report the failure");
}

// ============================================================================
// Content Guide Command Tests
// ============================================================================

#[test]
fn test_cli_cg_schedule() {
    let config = fixture_path("reference.toml");
    let document = fixture_path("schedule_valid.xml");
    let output = run(&["--config", &config, "cg", &document]);

    assert!(output.status.success(), "schedule response should validate");
}

#[test]
fn test_cli_cg_request_type() {
    let document = fixture_path("schedule_valid.xml");
    let output = run(&["cg", "--request", "program-info", &document]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "schedules are not program info");
    assert!(stdout.contains("not permitted for request"));

    let output = run(&["cg", "--request", "yesterday", &document]);
    assert!(!output.status.success(), "unknown request type should be refused");
}
