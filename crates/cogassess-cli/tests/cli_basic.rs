//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway data directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(data_dir, args, "")
}

fn run_cli_with_input(data_dir: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "cogassess-cli", "--"])
        .args(args)
        .env("COGASSESS_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut stdin = child.stdin.take().expect("stdin is piped");
        stdin.write_all(input.as_bytes()).expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_items_list_json() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["items", "list", "stroop", "--json"]);
    assert_eq!(code, 0, "items list failed");

    let items: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 20);
    assert_eq!(items[0]["kind"]["type"], "stroop");
}

#[test]
fn test_items_list_rejects_unknown_task() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["items", "list", "memory"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_defaults_and_set() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "math.full_secs"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "60");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "math.reduced_secs", "45"]);
    assert_eq!(code, 0, "config set failed");
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "math.reduced_secs"]);
    assert_eq!(stdout.trim(), "45");
}

#[test]
fn test_config_set_rejects_reduced_above_full() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "stroop.reduced_secs", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_get_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "nope.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nope.key"));
}

#[test]
fn test_session_export_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["session", "export"]);
    assert_eq!(code, 0, "session export failed");

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["summary"]["total_attempted"], 0);
    assert_eq!(report["summary"]["overall_accuracy_pct"], 0.0);
    assert!(report["session"]["session_id"]
        .as_str()
        .unwrap()
        .starts_with("session_"));
}

#[test]
fn test_session_reset_changes_id() {
    let dir = tempfile::tempdir().unwrap();
    let (before, _, _) = run_cli(dir.path(), &["session", "export"]);
    let before: serde_json::Value = serde_json::from_str(&before).unwrap();

    let (_, _, code) = run_cli(dir.path(), &["session", "reset"]);
    assert_eq!(code, 0);

    let (after, _, _) = run_cli(dir.path(), &["session", "export"]);
    let after: serde_json::Value = serde_json::from_str(&after).unwrap();
    assert_ne!(before["session"]["session_id"], after["session"]["session_id"]);
}

#[test]
fn test_run_math_records_answers() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "feedback.correct_delay_ms", "50"]);
    assert_eq!(code, 0);

    let (items, _, _) = run_cli(dir.path(), &["items", "list", "math", "--json"]);
    let items: serde_json::Value = serde_json::from_str(&items).unwrap();
    let answer = items[0]["answer"].as_str().unwrap().to_string();

    // Input closes right after the correct answer; the task still finishes.
    let input = format!("wrong\n{answer}\n");
    let (stdout, _, code) = run_cli_with_input(
        dir.path(),
        &["run", "math", "--limit", "1", "--json"],
        &input,
    );
    assert_eq!(code, 0, "run failed: {stdout}");
    assert!(stdout.contains("\"type\":\"AnswerIncorrect\""));
    assert!(stdout.contains("\"type\":\"ItemResolved\""));
    assert!(stdout.contains("\"type\":\"TaskCompleted\""));

    let (csv, _, code) = run_cli(dir.path(), &["session", "export", "--format", "csv"]);
    assert_eq!(code, 0);
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 2, "header plus one item row: {csv}");
    assert!(rows[1].contains(",math,0,math_1,"));
}

#[test]
fn test_session_export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");
    let (_, _, code) = run_cli(
        dir.path(),
        &["session", "export", "--format", "csv", "--out", out.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    let body = std::fs::read_to_string(&out).unwrap();
    assert!(body.starts_with("session_id,task,item_index"));
}

#[test]
fn test_run_completes_task_after_input_closes() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "feedback.correct_delay_ms", "50"]);
    assert_eq!(code, 0);

    let (items, _, _) = run_cli(dir.path(), &["items", "list", "math", "--json"]);
    let items: serde_json::Value = serde_json::from_str(&items).unwrap();
    let answer = items[0]["answer"].as_str().unwrap().to_string();

    let (stdout, _, code) =
        run_cli_with_input(dir.path(), &["run", "math", "--limit", "1"], &format!("{answer}\n"));
    assert_eq!(code, 0, "run failed: {stdout}");
    assert!(stdout.contains("math complete"));

    let (status, _, code) = run_cli(dir.path(), &["session", "status"]);
    assert_eq!(code, 0);
    assert!(status.contains("math     done"), "status: {status}");
    assert!(status.contains("next: stroop"), "status: {status}");
}

#[test]
fn test_session_export_csv_has_no_trailing_blank_row() {
    let dir = tempfile::tempdir().unwrap();
    let (csv, _, code) = run_cli(dir.path(), &["session", "export", "--format", "csv"]);
    assert_eq!(code, 0);
    assert_eq!(csv.lines().count(), 1, "only the header: {csv:?}");
    assert!(csv.ends_with("recorded_at\n"));
}

#[test]
fn test_run_rejects_verify_outside_captcha() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "math", "--verify"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--verify only applies to the captcha task"));
}
