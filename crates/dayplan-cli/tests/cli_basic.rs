//! Basic CLI E2E tests.
//!
//! Tests invoke the built `dayplan` binary against a throwaway data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command with `data_dir` as the data directory.
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dayplan"))
        .args(args)
        .env("DAYPLAN_DATA_DIR", data_dir)
        .env_remove("DAYPLAN_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_plan_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_json(dir.path(), &["plan", "--date", "2026-06-02", "--dinner", "Tacos", "--json"]);

    assert_eq!(summary["success"], true);
    assert_eq!(summary["date"], "2026-06-02");
    assert_eq!(summary["workout"], "Push");
    assert_eq!(summary["lunch"], "auto");
    assert_eq!(summary["dinner"], "Tacos");
    assert_eq!(summary["lunch_label"], "Lunch");
    assert_eq!(summary["dinner_label"], "Tacos");

    let blocks = run_json(dir.path(), &["show", "--date", "2026-06-02", "--json"]);
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len() as u64, summary["blocks_created"].as_u64().unwrap());
    assert!(blocks.iter().any(|b| b["title"] == "Tacos"));

    let (code, stdout, _) = run_cli(dir.path(), &["show", "--date", "2026-06-02"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("21:30-06:00"));
}

#[test]
fn test_replanning_replaces_blocks() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["plan", "--date", "2026-06-03", "--json"]);
    let second = run_json(dir.path(), &["plan", "--date", "2026-06-03", "--workout", "skip", "--json"]);
    assert_eq!(second["workout"], "skip");

    let blocks = run_json(dir.path(), &["show", "--date", "2026-06-03", "--json"]);
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len() as u64, second["blocks_created"].as_u64().unwrap());
    assert!(!blocks.iter().any(|b| b["title"] == "Push"));
}

#[test]
fn test_items_are_scheduled() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &["item", "add", "Quarterly report", "--minutes", "90", "--priority", "5"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Item created:"));

    let items = run_json(dir.path(), &["item", "list", "--json"]);
    let id = items[0]["id"].as_str().unwrap().to_string();

    run_json(dir.path(), &["plan", "--date", "2026-06-03", "--json"]);
    let blocks = run_json(dir.path(), &["show", "--date", "2026-06-03", "--json"]);
    assert!(blocks
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["work_item_id"] == id.as_str()));

    let (code, _, _) = run_cli(dir.path(), &["item", "done", &id]);
    assert_eq!(code, 0);
    let items = run_json(dir.path(), &["item", "list", "--json"]);
    assert!(items.as_array().unwrap().is_empty());
}

#[test]
fn test_history_drives_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(
        dir.path(),
        &["history", "record", "--date", "2026-06-02", "--workout", "Legs"],
    );
    assert_eq!(code, 0);
    let summary = run_json(dir.path(), &["plan", "--date", "2026-06-03", "--json"]);
    assert_eq!(summary["workout"], "Cardio");
}

#[test]
fn test_event_add_list_delete() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &["event", "add", "Dentist", "--date", "2026-06-03", "--start", "15:00", "--end", "16:00"],
    );
    assert_eq!(code, 0);
    let id = stdout.trim().trim_start_matches("Event created: ").to_string();

    let events = run_json(dir.path(), &["event", "list", "--date", "2026-06-03", "--json"]);
    assert_eq!(events.as_array().unwrap().len(), 1);

    let (code, _, _) = run_cli(dir.path(), &["event", "delete", &id]);
    assert_eq!(code, 0);
    let events = run_json(dir.path(), &["event", "list", "--date", "2026-06-03", "--json"]);
    assert!(events.as_array().unwrap().is_empty());
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "day.wake"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "06:00");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "overlay.gap_minutes", "15"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "overlay.gap_minutes"]);
    assert_eq!(stdout.trim(), "15");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_set_rejects_zero_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "day.shower_minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("day.shower_minutes"));

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "day.shower_minutes"]);
    assert_ne!(stdout.trim(), "0");
}

#[test]
fn test_skip_meal_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["plan", "--date", "2026-06-03", "--lunch", "skip"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_bad_date_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["plan", "--date", "06/03/2026"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("date"));
}
