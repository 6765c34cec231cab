//! End-to-end tests for the order-filter binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const CONFIG: &str = r#"
debug: 0
filter1:
  enabled: 1
  type: contact
  ids: "10,20"
filter2:
  enabled: 1
  type: billingAddress
  mode: deny
  ids: "7"
"#;

const ORDER: &str = r#"{"contactReceiverId": 10, "billingAddress": {"id": 7}}"#;

fn workspace(config: &str, order: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("filters.yaml"), config).expect("Failed to write config");
    fs::write(dir.path().join("order.json"), order).expect("Failed to write order");
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_order-filter"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to run order-filter")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_evaluate_prints_every_slot() {
    let dir = workspace(CONFIG, ORDER);
    let output = run(
        dir.path(),
        &["evaluate", "--order", "order.json", "--env-prefix", "CLI_TEST_EVAL_"],
    );

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec![
            "slot 1: true (value 10 via contactReceiverId, in list)",
            "slot 2: false (value 7 via billingAddress, in list)",
            "slot 3: false (disabled)",
            "slot 4: false (disabled)",
            "slot 5: false (disabled)",
            "slot 6: false (disabled)",
        ]
    );
}

#[test]
fn test_trace_forces_debug_and_prints_events() {
    let dir = workspace(CONFIG, ORDER);
    let output = run(
        dir.path(),
        &[
            "evaluate",
            "--order",
            "order.json",
            "--slot",
            "1",
            "--trace",
            "--env-prefix",
            "CLI_TEST_TRACE_",
        ],
    );

    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "slot 1: true (value 10 via contactReceiverId, in list)");

    let events: Vec<Value> = lines[1..]
        .iter()
        .map(|line| serde_json::from_str(line).expect("trace line is JSON"))
        .collect();
    let codes: Vec<&str> = events
        .iter()
        .map(|event| event["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["ping", "orderDump", "decision"]);

    let decision = &events[2]["context"];
    assert_eq!(decision["slot"], "1");
    assert_eq!(decision["value"], "10");
    assert_eq!(decision["result"], "true");
}

#[test]
fn test_env_override_applies() {
    let dir = workspace(CONFIG, ORDER);
    let output = Command::new(env!("CARGO_BIN_EXE_order-filter"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("CLI_TEST_ENV_FILTER1_MODE", "deny")
        .args([
            "evaluate",
            "--order",
            "order.json",
            "--slot",
            "1",
            "--env-prefix",
            "CLI_TEST_ENV_",
        ])
        .output()
        .expect("Failed to run order-filter");

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["slot 1: false (value 10 via contactReceiverId, in list)"]
    );
}

#[test]
fn test_slot_out_of_range_fails() {
    let dir = workspace(CONFIG, ORDER);
    let output = run(dir.path(), &["evaluate", "--order", "order.json", "--slot", "7"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Slot 7 out of range, expected 1-6"));
}

#[test]
fn test_missing_config_fails() {
    let dir = workspace(CONFIG, ORDER);
    let output = run(
        dir.path(),
        &["evaluate", "--config", "absent.yaml", "--order", "order.json"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}

#[test]
fn test_validate_reports_warnings() {
    let config = r#"
filter1:
  enabled: 1
  ids: ""
filter2:
  enabled: 1
  type: bogus
  ids: "5"
filter3:
  enabled: 1
  type: shippingAddress
  ids: "9"
"#;
    let dir = workspace(config, ORDER);
    let output = run(dir.path(), &["validate", "--env-prefix", "CLI_TEST_VALIDATE_"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("slot 1 is enabled but has no ids; it never passes"));
    assert!(stdout.contains("slot 2 has unknown type 'bogus'; it never passes"));
    assert!(stdout.contains("slot 3: enabled type=shippingAddress mode=allow ids=[9]"));
    assert!(stdout.contains("Configuration loaded with 2 warning(s)"));
}

#[test]
fn test_parse_ids() {
    let dir = workspace(CONFIG, ORDER);

    let output = run(dir.path(), &["parse-ids", "3\n1,1, x ,2"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["3", "1", "2"]);

    let output = run(dir.path(), &["parse-ids", ",,"]);
    assert_eq!(stdout_lines(&output), vec!["(no ids)"]);
}
