//! Integration tests for the `tally` CLI.
//!
//! Each test creates a temp workspace with a board snapshot, runs `tally`
//! as a subprocess, and verifies stdout and/or file contents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Get the path to the built `tally` binary.
fn tally_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tally");
    path
}

const BOARD_JSON: &str = r#"{
  "name": "Sprint 12",
  "columns": [
    {
      "title": "To do",
      "cards": [
        {"props": {"issue": {"id": 1, "path": "group/app", "title": "Fix login",
          "timeEstimate": 7200, "assignees": [{"name": "Ada"}]}}},
        {"props": {"issue": {"id": 2, "path": "group/app", "title": "Write docs",
          "timeEstimate": 3600, "assignees": [{"name": "Ada"}, {"name": "Grace"}]}}}
      ]
    },
    {
      "title": "Done",
      "cards": [
        {"props": {"issue": {"id": 3, "referencePath": "group/lib#3", "title": "Ship it",
          "milestone": {"title": "v1.2"}}}}
      ]
    },
    {
      "cards": [
        {"props": {"issue": {"id": 4, "path": "group/app", "title": "Lost",
          "timeEstimate": 9000}}}
      ]
    }
  ]
}"#;

/// Create a workspace with a starter config and a board snapshot.
fn create_test_workspace(root: &Path) {
    fs::write(root.join("board.json"), BOARD_JSON).unwrap();
    run_tally_ok(root, &["init"]);
}

/// Run `tally` with the given args in the given directory, returning (stdout, stderr, success).
fn run_tally(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(tally_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("TALLY_LOG")
        .output()
        .expect("failed to run tally");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `tally` expecting success, return stdout.
fn run_tally_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tally(dir, args);
    if !success {
        panic!(
            "tally {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `tally` with `input` on stdin, expecting success.
fn run_tally_stdin(dir: &Path, args: &[&str], input: &str) -> String {
    let mut child = Command::new(tally_bin())
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run tally");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "tally {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut all = args.to_vec();
    all.push("--json");
    let out = run_tally_ok(dir, &all);
    serde_json::from_str(&out).unwrap()
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tally_ok(tmp.path(), &["init", "--name", "Team board"]);
    assert!(out.contains("Initialized"));
    // No snapshot yet
    assert!(out.contains("does not exist yet"));

    let text = fs::read_to_string(tmp.path().join("tally.toml")).unwrap();
    assert!(text.contains("name = \"Team board\""));
    assert!(text.contains("file = \"board.json\""));
    assert!(tmp.path().join(".tally").is_dir());
}

#[test]
fn test_init_refuses_existing_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_tally_ok(tmp.path(), &["init"]);

    let (_, stderr, success) = run_tally(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    run_tally_ok(tmp.path(), &["init", "--force", "--file", "exports/b.json"]);
    let text = fs::read_to_string(tmp.path().join("tally.toml")).unwrap();
    assert!(text.contains("exports/b.json"));
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

#[test]
fn test_stats_text() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    // The untitled column's card is not counted
    let out = run_tally_ok(tmp.path(), &["stats"]);
    assert!(out.starts_with("Sprint 12\n"));
    assert!(out.contains("milestone: v1.2"));
    assert!(out.contains("total: 3h | cards: 3 | with time: 2 (67%) | closed: 1"));
    assert!(out.contains("Ada"));
    assert!(out.contains("Grace"));
}

#[test]
fn test_stats_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let json = run_json(tmp.path(), &["stats"]);
    assert_eq!(json["board"], "Sprint 12");
    assert_eq!(json["totalEstimateSeconds"], 10800.0);
    assert_eq!(json["cardsProcessed"], 3);
    assert_eq!(json["cardsWithTime"], 2);
    assert_eq!(json["closedColumnCardCount"], 1);
    assert_eq!(json["currentMilestone"], "v1.2");
    assert_eq!(json["assigneeTimeMap"]["Ada"]["timeEstimateSeconds"], 9000.0);
    assert_eq!(json["assigneeTimeMap"]["Grace"]["ticketCount"], 1);
    assert_eq!(json["boardData"]["To do"]["ticketCount"], 2);

    // Untitled column left out
    assert_eq!(json["boardData"].as_object().unwrap().len(), 2);
}

#[test]
fn test_stats_single_column() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let out = run_tally_ok(tmp.path(), &["stats", "--column", "To do"]);
    assert!(out.contains("assignees in To do:"));

    let json = run_json(tmp.path(), &["stats", "--column", "Done"]);
    assert_eq!(json["column"], "Done");
    assert_eq!(json["totals"]["ticketCount"], 1);

    let out = run_tally_ok(tmp.path(), &["stats", "--column", "Nope"]);
    assert!(out.contains("no column named 'Nope'"));
}

#[test]
fn test_board_override_and_project_dir() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    fs::write(
        tmp.path().join("other.json"),
        r#"{"name": "Other", "columns": [{"title": "Doing", "cards": []}]}"#,
    )
    .unwrap();

    let out = run_tally_ok(tmp.path(), &["stats", "--board", "other.json"]);
    assert!(out.starts_with("Other\n"));

    let elsewhere = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_string_lossy().to_string();
    let out = run_tally_ok(elsewhere.path(), &["-C", &dir, "stats"]);
    assert!(out.starts_with("Sprint 12\n"));
}

#[test]
fn test_missing_board_is_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_tally(tmp.path(), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("error: could not read board"));
}

// ---------------------------------------------------------------------------
// select
// ---------------------------------------------------------------------------

#[test]
fn test_select_keeps_toggle_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let out = run_tally_ok(tmp.path(), &["select", "2", "1"]);
    assert_eq!(
        out,
        "  1. group/app#2  Write docs\n  2. group/app#1  Fix login\n"
    );

    // Toggling an id twice removes it
    let json = run_json(tmp.path(), &["select", "1", "3", "1"]);
    let issues = json["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["id"], "3");
    assert_eq!(issues[0]["scopePath"], "group/lib");
}

#[test]
fn test_select_warns_on_unknown_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let (stdout, stderr, success) = run_tally(tmp.path(), &["select", "99"]);
    assert!(success);
    assert_eq!(stdout, "nothing selected\n");
    assert!(stderr.contains("no card on the board for issue 99"));

    let (stdout, _, _) = run_tally(tmp.path(), &["select", "3", "--scope", "group/app"]);
    assert_eq!(stdout, "nothing selected\n");
}

// ---------------------------------------------------------------------------
// edit / commands
// ---------------------------------------------------------------------------

#[test]
fn test_edit_from_stdin() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tally_stdin(tmp.path(), &["edit", "estimate", "4"], "Looks good");
    assert_eq!(out, "Looks good\n/estimate 4h");

    let out = run_tally_stdin(
        tmp.path(),
        &["edit", "estimate", "2", "--json"],
        "Looks good\n/estimate 4h",
    );
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["buffer"], "Looks good\n/estimate 2h");
    assert_eq!(json["outcome"], "replaced");
}

#[test]
fn test_edit_in_place() {
    let tmp = tempfile::TempDir::new().unwrap();
    let note = tmp.path().join("note.md");
    fs::write(&note, "Ready for review").unwrap();

    let out = run_tally_ok(
        tmp.path(),
        &["edit", "label", "bug, ui", "--file", "note.md", "--in-place"],
    );
    assert_eq!(out, "");
    assert_eq!(
        fs::read_to_string(&note).unwrap(),
        "Ready for review\n/label ~bug ~ui"
    );
}

#[test]
fn test_edit_unknown_type_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("note.md"), "").unwrap();
    let (_, stderr, success) = run_tally(
        tmp.path(),
        &["edit", "spend", "1h", "--file", "note.md"],
    );
    assert!(!success);
    assert!(stderr.contains("spend"));
}

#[test]
fn test_edit_rejects_multi_line_values() {
    let tmp = tempfile::TempDir::new().unwrap();
    let note = tmp.path().join("note.md");
    fs::write(&note, "/estimate 4h").unwrap();

    let (_, stderr, success) = run_tally(
        tmp.path(),
        &["edit", "estimate", "4\n/estimate 9", "--file", "note.md", "--in-place"],
    );
    assert!(!success);
    assert!(stderr.contains("must fit on one line"));
    assert_eq!(fs::read_to_string(&note).unwrap(), "/estimate 4h");
}

#[test]
fn test_commands_list() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tally_ok(tmp.path(), &["commands"]);
    let kinds: Vec<&str> = out
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(
        kinds,
        vec!["estimate", "label", "milestone", "assign", "due", "weight"]
    );
    assert!(out.contains("^/estimate .*$"));
}

#[test]
fn test_commands_add() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let out = run_tally_ok(
        tmp.path(),
        &["commands", "add", "spend", "^/spend .*$", "/spend {value}"],
    );
    assert!(out.contains("added command 'spend'"));
    let text = fs::read_to_string(tmp.path().join("tally.toml")).unwrap();
    assert!(text.contains("[[commands]]"));

    let json = run_json(tmp.path(), &["commands"]);
    let last = json.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["type"], "spend");

    fs::write(tmp.path().join("note.md"), "").unwrap();
    let out = run_tally_ok(tmp.path(), &["edit", "spend", "1h", "--file", "note.md"]);
    assert_eq!(out, "/spend 1h");

    // Duplicates are rejected and the config is left alone
    let (_, _, success) = run_tally(
        tmp.path(),
        &["commands", "add", "spend", "^/spend .*$", "/spend {value}"],
    );
    assert!(!success);
    assert_eq!(fs::read_to_string(tmp.path().join("tally.toml")).unwrap(), text);
}

#[test]
fn test_commands_add_needs_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_tally(
        tmp.path(),
        &["commands", "add", "spend", "^/spend .*$", "/spend {value}"],
    );
    assert!(!success);
    assert!(stderr.contains("run `tally init` first"));
}

// ---------------------------------------------------------------------------
// commit / history
// ---------------------------------------------------------------------------

#[test]
fn test_commit_then_history() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let out = run_tally_ok(tmp.path(), &["history"]);
    assert_eq!(out, "no history recorded\n");

    let out = run_tally_ok(tmp.path(), &["commit"]);
    assert_eq!(out, "recorded 3h for Sprint 12\n");
    assert!(tmp.path().join(".tally/history.json").is_file());

    // Unchanged board: nothing new to record
    let json = run_json(tmp.path(), &["commit"]);
    assert_eq!(json["changed"], false);
    assert_eq!(json["totalEstimateSeconds"], 10800.0);

    let out = run_tally_ok(tmp.path(), &["history"]);
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("3h"));
    assert!(out.contains("3 cards (2 with time)"));

    let json = run_json(tmp.path(), &["history"]);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["board"], "Sprint 12");
}

#[test]
fn test_commit_records_changes() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    run_tally_ok(tmp.path(), &["commit"]);

    let board = BOARD_JSON.replace("\"timeEstimate\": 3600", "\"timeEstimate\": 7200");
    fs::write(tmp.path().join("board.json"), board).unwrap();
    let out = run_tally_ok(tmp.path(), &["commit"]);
    assert_eq!(out, "recorded 4h for Sprint 12\n");

    let json = run_json(tmp.path(), &["history", "--limit", "1"]);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["totalEstimateSeconds"], 14400.0);
}
