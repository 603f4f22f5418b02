//! Integration tests for the pillbox binary.
//!
//! These tests verify end-to-end behavior including:
//! - Catalog management and trash
//! - Session recording and history display
//! - Confirmation gating
//! - Email outbox and CSV export
//! - Announcements and corrupt state recovery

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to run the CLI against an isolated data and config directory
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pillbox").expect("Failed to find pillbox binary");
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn read_state(dir: &Path) -> serde_json::Value {
    let contents = fs::read_to_string(dir.join("data/state.json")).expect("Failed to read state");
    serde_json::from_str(&contents).expect("State is not valid JSON")
}

fn add_pill(dir: &Path, name: &str, dosage: &str, unit: &str) {
    cli(dir)
        .args(["add", name, dosage, unit])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pill Added!"));
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal medication tracker"));
}

#[test]
fn test_add_and_list_sorted() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "zinc", "50", "mg");
    add_pill(dir, "Aspirin", "100", "mg");
    add_pill(dir, "biotin", "5", "mcg");

    cli(dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)0\. Aspirin: 100mg.*1\. biotin: 5mcg.*2\. zinc: 50mg").unwrap());
}

#[test]
fn test_duplicate_pill_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "Aspirin", "100", "mg");
    cli(dir)
        .args(["add", "Aspirin", "100", "mg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already have a pill"));

    assert_eq!(read_state(dir)["pills"].as_array().unwrap().len(), 1);
}

#[test]
fn test_delete_restore_and_empty_trash() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "Aspirin", "100", "mg");
    add_pill(dir, "Zinc", "50", "mg");

    cli(dir).args(["delete", "0"]).assert().success();
    cli(dir)
        .args(["list", "--trash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Aspirin: 100mg"));

    cli(dir).args(["restore", "0"]).assert().success();
    assert!(read_state(dir)["pill_trash"].as_array().unwrap().is_empty());

    cli(dir).args(["delete", "1"]).assert().success();

    // Declined on empty stdin
    cli(dir).arg("empty-trash").write_stdin("\n").assert().success();
    assert_eq!(read_state(dir)["pill_trash"].as_array().unwrap().len(), 1);

    cli(dir)
        .args(["empty-trash", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trash emptied"));
    assert!(read_state(dir)["pill_trash"].as_array().unwrap().is_empty());
}

#[test]
fn test_delete_out_of_range_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path()).args(["delete", "3"]).assert().failure();
}

#[test]
fn test_take_merges_and_shows_history() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "Aspirin", "100", "mg");
    add_pill(dir, "Zinc", "50", "mg");

    cli(dir)
        .args(["take", "--dose", "1", "--dose", "0x2", "--dose", "1x2", "--note", "with food"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pills Taken!"))
        .stdout(predicate::str::contains("Zinc 50mg x 3"));

    cli(dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("with food"))
        .stdout(predicate::str::contains("Aspirin, 100mg X 2"));

    let state = read_state(dir);
    let session = state["history"][0]["session"].as_array().unwrap();
    assert_eq!(session.len(), 2);
    assert_eq!(session[1]["quantity"], 3);
}

#[test]
fn test_note_only_session_needs_confirmation() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["take", "--note", "skipped"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing recorded."));

    cli(dir)
        .args(["take", "--note", "skipped"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pills Taken!"));

    assert_eq!(read_state(dir)["history"].as_array().unwrap().len(), 1);
}

#[test]
fn test_history_filter() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "Aspirin", "100", "mg");
    add_pill(dir, "Zinc", "50", "mg");
    cli(dir).args(["take", "--dose", "0", "--note", "first"]).assert().success();
    cli(dir).args(["take", "--dose", "1", "--note", "second"]).assert().success();

    cli(dir)
        .args(["history", "--filter", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second"))
        .stdout(predicate::str::contains("first").not());
}

#[test]
fn test_order_and_clear_history() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir).args(["--yes", "take", "--note", "one"]).assert().success();
    cli(dir).args(["--yes", "take", "--note", "two"]).assert().success();

    cli(dir)
        .args(["order", "old-first"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Old → New"));
    let state = read_state(dir);
    assert_eq!(state["history_is_reverse"], true);
    assert_eq!(state["history"][0]["note"], "one");

    cli(dir).args(["--yes", "clear-history"]).assert().success();
    let state = read_state(dir);
    assert!(state["history"].as_array().unwrap().is_empty());
    assert_eq!(state["history_trash"].as_array().unwrap().len(), 1);
    assert_eq!(state["history_trash"][0].as_array().unwrap().len(), 2);
}

#[test]
fn test_email_writes_outbox_and_marks_sent() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "Aspirin", "100", "mg");
    cli(dir).args(["take", "--dose", "0"]).assert().success();

    cli(dir)
        .args(["email", "--to", "me@example.com", "--scope", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Email Sent!"));

    let outbox = fs::read_to_string(dir.join("data/outbox.jsonl")).unwrap();
    assert_eq!(outbox.lines().count(), 1);
    assert!(outbox.contains("me@example.com"));
    assert!(!read_state(dir)["history"][0]["date_emailed"].is_null());
}

#[test]
fn test_email_without_recipient_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir).args(["--yes", "take", "--note", "x"]).assert().success();
    cli(dir).arg("email").assert().failure();
    assert!(!dir.join("data/outbox.jsonl").exists());
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_pill(dir, "Aspirin", "100", "mg");
    cli(dir).args(["take", "--dose", "0x2"]).assert().success();

    let csv_path = dir.join("history.csv");
    cli(dir)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 rows"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("record_id,date"));
    assert!(contents.contains("Aspirin"));
}

#[test]
fn test_corrupted_state_file_recovers() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(dir.join("data/state.json"), "{ invalid json }}}}").unwrap();

    add_pill(dir, "Aspirin", "100", "mg");
    assert_eq!(read_state(dir)["pills"].as_array().unwrap().len(), 1);

    // The unreadable file is kept next to the new one
    let backups: Vec<_> = fs::read_dir(dir.join("data"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("state.json.corrupt-")
        })
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(
        fs::read_to_string(backups[0].path()).unwrap(),
        "{ invalid json }}}}"
    );
}

#[test]
fn test_invalid_dosage_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    for dosage in ["NaN", "inf", "ten"] {
        cli(dir)
            .args(["add", "Aspirin", dosage, "mg"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("dosage"));
    }
    cli(dir)
        .args(["add", "--", "Aspirin", "-1", "mg"])
        .assert()
        .failure();
    assert!(!dir.join("data/state.json").exists());
}

#[test]
fn test_sounds_toggle_announcements() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["add", "Aspirin", "100", "mg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("♪ Aspirin 100 mg"));
    cli(dir)
        .args(["take", "--dose", "0x2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("♪ 2 Aspirin 100 mg"));

    cli(dir).args(["sounds", "off"]).assert().success();
    cli(dir)
        .args(["add", "Zinc", "50", "mg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pill Added!"))
        .stdout(predicate::str::contains("♪").not());
}

#[test]
fn test_outbox_lists_queued_email() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .arg("outbox")
        .assert()
        .success()
        .stdout(predicate::str::contains("Outbox is empty."));

    add_pill(dir, "Aspirin", "100", "mg");
    cli(dir).args(["take", "--dose", "0"]).assert().success();
    cli(dir)
        .args(["email", "--to", "me@example.com"])
        .assert()
        .success();

    cli(dir)
        .arg("outbox")
        .assert()
        .success()
        .stdout(predicate::str::contains("me@example.com"))
        .stdout(predicate::str::contains("1 records"));
}

#[test]
fn test_huge_recent_days_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let config_dir = dir.join("config/pillbox");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[email]\nrecent_days = 1000000000000\n",
    )
    .unwrap();

    cli(dir)
        .args(["email", "--to", "me@example.com", "--scope", "recent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("recent_days"));
}

#[test]
fn test_config_seeds_new_state() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let config_dir = dir.join("config/pillbox");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[preferences]\nhistory_reverse = true\nplay_sounds = false\n",
    )
    .unwrap();

    add_pill(dir, "Aspirin", "100", "mg");
    let state = read_state(dir);
    assert_eq!(state["history_is_reverse"], true);
    assert_eq!(state["play_sounds"], false);
}
