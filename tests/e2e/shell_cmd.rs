//! Interactive shell tests, driven through stdin.

use std::time::Duration;

use serde_json::Value;

use crate::common::cli::CliRunner;
use crate::common::fixtures::Workspace;
use crate::common::init_test_logging;

/// Shell sessions read stdin until it closes; fail instead of hanging.
const SHELL_TIMEOUT: Duration = Duration::from_secs(20);

fn shell() -> CliRunner {
    CliRunner::mock().with_timeout(SHELL_TIMEOUT)
}

fn with_status<'a>(values: &'a [Value], status: &str) -> Vec<&'a Value> {
    values.iter().filter(|v| v["status"] == status).collect()
}

fn history_views(values: &[Value]) -> Vec<&Value> {
    values.iter().filter(|v| v.get("revision").is_some()).collect()
}

#[test]
fn shell_capture_list_and_quick_save() {
    init_test_logging();
    let ws = Workspace::new();

    let result = shell()
        .with_stdin("capture\ncapture\nlist\nquick-save 0\nquit\n")
        .run_robot(&["--config", ws.config_arg(), "shell"]);
    result.assert_success();

    let values = result.json_values();
    assert_eq!(with_status(&values, "captured").len(), 2);

    // The watcher and `list` both render history; the newest view holds both shots.
    let newest = history_views(&values)
        .into_iter()
        .max_by_key(|v| v["revision"].as_u64())
        .unwrap();
    assert_eq!(newest["count"], 2);

    let saved: Vec<_> = values.iter().filter(|v| v["saved"] == true).collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["id"], newest["items"][0]["id"]);
    assert_eq!(ws.saved_pngs().len(), 1);
}

#[test]
fn shell_errors_do_not_end_session() {
    init_test_logging();
    let ws = Workspace::new();

    let result = shell()
        .with_stdin("quick-save\nbogus\ncapture\nquick-save\n")
        .run_robot(&["--config", ws.config_arg(), "shell"]);
    result.assert_success().assert_stderr_contains("bogus");

    assert_eq!(ws.saved_pngs().len(), 1);
}

#[test]
fn shell_history_is_bounded() {
    init_test_logging();
    let ws = Workspace::new();
    let input = "capture\n".repeat(12) + "list\n";

    let result = shell()
        .with_stdin(&input)
        .run_robot(&["--config", ws.config_arg(), "shell"]);
    result.assert_success();

    let values = result.json_values();
    assert_eq!(with_status(&values, "captured").len(), 12);
    assert!(history_views(&values).iter().all(|v| v["count"].as_u64() <= Some(10)));
    let newest = history_views(&values)
        .into_iter()
        .max_by_key(|v| v["revision"].as_u64())
        .unwrap();
    assert_eq!(newest["count"], 10);
}

#[test]
fn shell_clear_empties_history() {
    init_test_logging();
    let ws = Workspace::new();

    let result = shell()
        .with_stdin("capture\nclear\nlist\n")
        .run_robot(&["--config", ws.config_arg(), "shell"]);
    result.assert_success();

    let values = result.json_values();
    let newest = history_views(&values)
        .into_iter()
        .max_by_key(|v| v["revision"].as_u64())
        .unwrap();
    assert_eq!(newest["count"], 0);
}

#[test]
fn shell_ends_on_closed_stdin() {
    init_test_logging();
    shell()
        .run(&["shell", "--quiet"])
        .assert_success()
        .assert_stdout_is_empty()
        .assert_duration_under(Duration::from_secs(5));
}
