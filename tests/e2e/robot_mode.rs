//! Robot-mode end-to-end tests.

use std::path::Path;

use serde_json::Value;

use crate::common::cli::CliRunner;
use crate::common::fixtures::{Workspace, png_files};
use crate::common::init_test_logging;

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let result = CliRunner::new().run(&["--robot"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json["tool"], "snap");
    assert!(json["shell"]["commands"].is_array());
    assert!(json.get("output_modes").is_some());
}

#[test]
fn robot_version_reports_package_version() {
    init_test_logging();
    CliRunner::new()
        .run(&["version", "--format=json"])
        .assert_success()
        .assert_json_field("/version", &Value::from(env!("CARGO_PKG_VERSION")))
        .assert_json_field_exists("/target");
}

#[test]
fn robot_compact_format_is_one_line() {
    init_test_logging();
    let result = CliRunner::new().run(&["--format=json-compact", "version"]);
    result.assert_success();
    assert_eq!(result.stdout.trim().lines().count(), 1);
}

#[test]
fn robot_capture_into_directory() {
    init_test_logging();
    let temp = tempfile::TempDir::new().unwrap();
    let dir = temp.path().join("out");

    let result = CliRunner::mock().run_robot(&["capture", "--dir", dir.to_str().unwrap()]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json["saved"], true);
    assert_eq!(json["width"], 320);
    assert_eq!(json["height"], 200);
    let path = json["path"].as_str().unwrap();
    assert!(Path::new(path).starts_with(&dir), "{path}");
    assert_eq!(png_files(&dir).len(), 1);
}

#[test]
fn robot_capture_to_file_adds_extension() {
    init_test_logging();
    let temp = tempfile::TempDir::new().unwrap();
    let target = temp.path().join("desk");

    let result = CliRunner::mock().run_robot(&["capture", "--out", target.to_str().unwrap()]);
    result.assert_success();

    let expected = temp.path().join("desk.png");
    assert_eq!(result.json()["path"], expected.display().to_string());
    let decoded = image::open(&expected).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 200));
}

#[test]
fn robot_capture_uses_configured_save_directory() {
    init_test_logging();
    let ws = Workspace::new();

    CliRunner::mock()
        .run_robot(&["--config", ws.config_arg(), "capture"])
        .assert_success();
    CliRunner::mock()
        .run_robot(&["--config", ws.config_arg(), "capture"])
        .assert_success();

    assert_eq!(ws.saved_pngs().len(), 2);
}

#[cfg(not(feature = "native"))]
#[test]
fn robot_capture_without_platform_backend_fails() {
    init_test_logging();
    let result = CliRunner::new().run_robot(&["capture"]);
    result.assert_exit_code(1).assert_stdout_is_empty();

    let err = result.stderr_json();
    assert_eq!(err["error"], true);
    assert!(err["message"].as_str().unwrap().contains("unavailable"));
    assert!(err["suggestion"].as_str().unwrap().contains("--backend mock"));
}

#[test]
fn robot_invalid_config_is_reported() {
    init_test_logging();
    let ws = Workspace::with_settings("[capture]\ntimeout_secs = 0\n");

    let result = CliRunner::mock().run_robot(&["--config", ws.config_arg(), "capture"]);
    result.assert_exit_code(1);

    let err = result.stderr_json();
    assert_eq!(err["recoverable"], true);
    assert!(err["message"].as_str().unwrap().contains("timeout_secs"));
    assert!(png_files(&ws.path().join("shots")).is_empty());
}

#[test]
fn robot_missing_config_file_is_error() {
    init_test_logging();
    let result = CliRunner::mock().run_robot(&["--config", "/nonexistent/snap.toml", "config"]);
    result.assert_exit_code(1);
    assert_eq!(result.stderr_json()["recoverable"], true);
}

#[test]
fn robot_config_shows_effective_settings() {
    init_test_logging();
    let ws = Workspace::new();

    let result = CliRunner::new().run_robot(&["--config", ws.config_arg(), "config"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json["source"], ws.config_arg());
    assert_eq!(json["settings"]["capture"]["timeout_secs"], 2);
    assert_eq!(json["settings"]["capture"]["backend"], "auto");
    assert_eq!(json["save_directory"], ws.shots_dir().display().to_string());
}

#[test]
fn robot_config_without_file_uses_defaults() {
    init_test_logging();
    let result = CliRunner::new().run_robot(&["config"]);
    result.assert_success();

    let json = result.json();
    assert!(json["source"].is_null());
    assert_eq!(json["settings"]["capture"]["timeout_secs"], 5);
    assert_eq!(json["settings"]["capture"]["exclude_own_windows"], true);
}

#[test]
fn robot_config_path() {
    init_test_logging();
    let ws = Workspace::new();
    CliRunner::new()
        .run_robot(&["--config", ws.config_arg(), "config", "--path"])
        .assert_success()
        .assert_json_field("/message", &Value::from(ws.config_arg()));
}

#[test]
fn robot_permission_status() {
    init_test_logging();
    // No preflight is available to this build, so the gate reports permitted.
    CliRunner::new()
        .run_robot(&["permission"])
        .assert_success()
        .assert_json_field("/permitted", &Value::Bool(true));
}
