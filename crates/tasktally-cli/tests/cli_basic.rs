//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tasktally"))
        .args(args)
        .env("TASKTALLY_HOME", home)
        .env("TASKTALLY_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn add_task(home: &Path, args: &[&str]) -> String {
    let mut full = vec!["task", "add"];
    full.extend_from_slice(args);
    let stdout = run_ok(home, &full);
    stdout
        .trim()
        .strip_prefix("Task created: ")
        .expect("task id in output")
        .to_string()
}

#[test]
fn test_task_add_and_list_json() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Write report", "--allocated", "90"]);

    let stdout = run_ok(home.path(), &["task", "list", "--json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id.as_str());
    assert_eq!(rows[0]["title"], "Write report");
    assert_eq!(rows[0]["time_allocated"], 90);
    assert_eq!(rows[0]["totals"]["total"], 0);
}

#[test]
fn test_tasks_file_uses_snake_case_records() {
    let home = TempDir::new().unwrap();
    add_task(home.path(), &["Read", "--pomodoro", "true", "--work", "50"]);

    let raw = std::fs::read_to_string(home.path().join("tasks.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &records[0];
    assert_eq!(record["use_pomodoro"], true);
    assert_eq!(record["pomodoro_work"], 50);
    assert_eq!(record["pomodoro_cycles"], 4);
    assert!(record["sessions"].as_array().unwrap().is_empty());
}

#[test]
fn test_invalid_pomodoro_cycles_rejected() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["task", "add", "Bad", "--pomodoro", "true", "--cycles", "0"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid configuration"), "{stderr}");
}

#[test]
fn test_edit_and_remove_task() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Draft"]);

    run_ok(
        home.path(),
        &["task", "edit", &id, "--title", "Final draft", "--completed", "true"],
    );
    let stdout = run_ok(home.path(), &["task", "show", &id]);
    let task: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(task["title"], "Final draft");
    assert_eq!(task["is_completed"], true);

    run_ok(home.path(), &["task", "remove", &id]);
    let (_, stderr, code) = run_cli(home.path(), &["task", "show", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown task"));
}

#[test]
fn test_track_for_limited_time_records_a_session() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Focus"]);

    let stdout = run_ok(home.path(), &["track", &id, "--for", "2"]);
    assert!(stdout.contains("Tracking \"Focus\""));
    assert!(stdout.contains("Stopped."));

    let shown = run_ok(home.path(), &["task", "show", &id]);
    let task: serde_json::Value = serde_json::from_str(&shown).unwrap();
    let sessions = task["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0]["end"].is_null());
}

#[test]
fn test_stats_json_has_overall_row() {
    let home = TempDir::new().unwrap();
    add_task(home.path(), &["One"]);
    add_task(home.path(), &["Two"]);

    let stdout = run_ok(home.path(), &["stats", "--json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[2]["id"].is_null());
    assert_eq!(rows[2]["title"], "All tasks");
}

#[test]
fn test_report_json_buckets() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Plan", "--allocated", "30"]);

    let stdout = run_ok(
        home.path(),
        &[
            "report", &id, "--period", "week", "--from", "2024-01-01", "--to", "2024-01-14",
            "--json",
        ],
    );
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["period"], "week");
    assert_eq!(report["buckets"].as_array().unwrap().len(), 2);
    assert_eq!(report["total_allocated_secs"], 14 * 30 * 60);
}

#[test]
fn test_advice_for_completed_task() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Done already"]);
    run_ok(home.path(), &["task", "edit", &id, "--completed", "true"]);

    let stdout = run_ok(home.path(), &["advice", &id]);
    assert_eq!(stdout.trim(), "Task completed, great work!");
}

#[test]
fn test_config_set_get_roundtrip() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "set", "pomodoro.work_min", "45"]).trim(), "ok");
    assert_eq!(run_ok(home.path(), &["config", "get", "pomodoro.work_min"]).trim(), "45");

    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    run_ok(home.path(), &["config", "reset"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "pomodoro.work_min"]).trim(), "25");
}

#[test]
fn test_config_defaults_apply_to_new_tasks() {
    let home = TempDir::new().unwrap();
    run_ok(home.path(), &["config", "set", "pomodoro.enabled", "true"]);
    run_ok(home.path(), &["config", "set", "tracking.default_time_allocated", "15"]);
    let id = add_task(home.path(), &["Defaults"]);

    let shown = run_ok(home.path(), &["task", "show", &id]);
    let task: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(task["use_pomodoro"], true);
    assert_eq!(task["time_allocated"], 15);
}

#[test]
fn test_edits_are_refused_while_another_process_tracks() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Focus"]);

    let mut tracking = Command::new(env!("CARGO_BIN_EXE_tasktally"))
        .args(["track", &id, "--for", "3"])
        .env("TASKTALLY_HOME", home.path())
        .env("TASKTALLY_LOG", "off")
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn tracker");
    // The first line is printed after the tasks file is locked.
    let mut stdout = BufReader::new(tracking.stdout.take().unwrap());
    let mut first = String::new();
    stdout.read_line(&mut first).unwrap();
    assert!(first.starts_with("Tracking"));

    let (_, stderr, code) = run_cli(home.path(), &["task", "add", "Sneaky"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("in use"), "{stderr}");
    // Readers never take the lock.
    run_ok(home.path(), &["task", "list"]);

    let mut rest = String::new();
    std::io::Read::read_to_string(&mut stdout, &mut rest).unwrap();
    assert!(tracking.wait().unwrap().success());

    let listed = run_ok(home.path(), &["task", "list", "--json"]);
    let rows: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    let shown = run_ok(home.path(), &["task", "show", &id]);
    let task: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(task["sessions"].as_array().unwrap().len(), 1);

    // Lock released on exit.
    add_task(home.path(), &["After"]);
}

#[test]
fn test_task_log_records_a_manual_session() {
    let home = TempDir::new().unwrap();
    let id = add_task(home.path(), &["Reading"]);

    let stdout = run_ok(
        home.path(),
        &[
            "task",
            "log",
            &id,
            "--start",
            "2024-05-01T09:00:00",
            "--end",
            "2024-05-01T09:45:00",
        ],
    );
    assert!(stdout.contains("00:45:00"));

    let shown = run_ok(home.path(), &["task", "show", &id]);
    let task: serde_json::Value = serde_json::from_str(&shown).unwrap();
    let sessions = task["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["start"], "2024-05-01T09:00:00");
    assert_eq!(sessions[0]["end"], "2024-05-01T09:45:00");

    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "task",
            "log",
            &id,
            "--start",
            "2024-05-01T10:00:00",
            "--end",
            "2024-05-01T09:00:00",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("before its start"), "{stderr}");
}
