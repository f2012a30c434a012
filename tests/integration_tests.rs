//! Integration tests for the awb CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use awb::core::tool::ToolKey;
use predicates::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

/// Helper to get an awb command isolated from the user's config
fn awb(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("awb").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env("HOME", tmp.path())
        .env_remove("AWB_WORKSPACE")
        .env_remove("AWB_BACKEND")
        .env_remove("AWB_NAMESPACE")
        .env_remove("AWB_LOG");
    cmd
}

/// Helper to create a workspace with one active project
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    awb(&tmp).arg("init").assert().success();
    awb(&tmp)
        .args(["project", "new", "Acme", "-d", "Widgets"])
        .assert()
        .success();
    tmp
}

/// Run a command with `-f id` and return the printed id
fn create(tmp: &TempDir, args: &[&str]) -> String {
    let output = awb(tmp).args(args).args(["-f", "id"]).output().unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn create_story(tmp: &TempDir, action: &str, points: &str) -> String {
    create(
        tmp,
        &["story", "new", "--role", "user", "--action", action, "--points", points],
    )
}

fn stdout_of(tmp: &TempDir, args: &[&str]) -> String {
    let output = awb(tmp).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("epic"))
        .stdout(predicate::str::contains("sprint"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("awb"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp).arg("frobnicate").assert().failure();
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("awb"));
}

// ============================================================================
// Workspace Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized awb workspace"));

    let config = fs::read_to_string(tmp.path().join(".awb/config.yaml")).unwrap();
    assert!(config.contains("backend: files"));
}

#[test]
fn test_init_twice_reports_existing() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp).arg("init").assert().success();
    awb(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_command_outside_workspace_fails() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp)
        .args(["epic", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("awb init"));
}

#[test]
fn test_tool_command_without_project_fails() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp).arg("init").assert().success();
    awb(&tmp)
        .args(["epic", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no active project"));
}

#[test]
fn test_sqlite_backend_persists() {
    let tmp = TempDir::new().unwrap();
    awb(&tmp)
        .args(["init", "--backend", "sqlite", "--project", "Acme"])
        .assert()
        .success();
    create(&tmp, &["epic", "new", "Checkout"]);

    assert!(tmp.path().join(".awb/store.db").exists());
    awb(&tmp)
        .args(["epic", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checkout"));
}

// ============================================================================
// Project Tests
// ============================================================================

#[test]
fn test_project_list_marks_active() {
    let tmp = setup_workspace();
    awb(&tmp).args(["project", "new", "Beta"]).assert().success();

    let out = stdout_of(&tmp, &["project", "list", "-f", "csv"]);
    let active: Vec<&str> = out.lines().filter(|l| l.starts_with('*')).collect();
    assert_eq!(active.len(), 1);
    assert!(active[0].contains("Beta"));
}

#[test]
fn test_project_duplicate_name_fails() {
    let tmp = setup_workspace();
    awb(&tmp)
        .args(["project", "new", "acme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_projects_are_isolated() {
    let tmp = setup_workspace();
    create(&tmp, &["epic", "new", "Only in Acme"]);

    awb(&tmp).args(["project", "new", "Beta"]).assert().success();
    awb(&tmp)
        .args(["epic", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No epics found"));

    awb(&tmp).args(["project", "select", "Acme"]).assert().success();
    awb(&tmp)
        .args(["epic", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Only in Acme"));
}

#[test]
fn test_project_delete_removes_its_documents() {
    let tmp = setup_workspace();
    let beta = create(&tmp, &["project", "new", "Beta"]);
    create(&tmp, &["epic", "new", "Beta epic"]);
    create_story(&tmp, "log in", "3");

    let store_dir = tmp.path().join(".awb/store");
    let count_for = |id: &str| {
        fs::read_dir(&store_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(id))
            .count()
    };
    assert!(count_for(&beta) >= 2);

    awb(&tmp)
        .args(["project", "delete", "Beta", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active project: Acme"));
    assert_eq!(count_for(&beta), 0);
}

#[test]
fn test_every_scoped_key_is_registered() {
    let tmp = setup_workspace();
    let project = stdout_of(&tmp, &["project", "list", "-f", "id"]).trim().to_string();

    create(&tmp, &["epic", "new", "Checkout"]);
    create_story(&tmp, "pay", "2");
    awb(&tmp).args(["sprint", "list"]).assert().success();
    awb(&tmp).args(["team", "add", "Alice"]).assert().success();
    awb(&tmp).args(["team", "config", "--days", "8"]).assert().success();
    awb(&tmp).args(["raci", "add-task", "Design"]).assert().success();
    create(&tmp, &["retro", "new"]);
    create(&tmp, &["decision", "new", "Use SQLite"]);
    create(&tmp, &["risk", "new", "Scope creep", "-p", "3", "-i", "3"]);

    let mut written = BTreeSet::new();
    for entry in fs::read_dir(tmp.path().join(".awb/store")).unwrap() {
        let name = entry.unwrap().file_name().to_string_lossy().to_string();
        let key = name
            .strip_prefix("awb.")
            .and_then(|k| k.strip_suffix(".json"))
            .unwrap()
            .to_string();
        if key == "projects" {
            continue;
        }
        let tool = ToolKey::from_scoped_key(&key, &project)
            .unwrap_or_else(|| panic!("unregistered key {}", key));
        written.insert(tool);
    }
    let registered: BTreeSet<ToolKey> = ToolKey::all().iter().copied().collect();
    assert_eq!(written, registered);
}

#[test]
fn test_project_doc_import_from_json() {
    let tmp = setup_workspace();
    let brd = tmp.path().join("brd.json");
    fs::write(
        &brd,
        r#"{"sections": [{"title": "Objectives", "content": "Cut churn."}]}"#,
    )
    .unwrap();

    awb(&tmp)
        .args(["project", "doc", "import", "brd", brd.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 section(s)"));
    awb(&tmp)
        .args(["project", "doc", "show", "brd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cut churn."));
}

#[test]
fn test_project_doc_import_and_export() {
    let tmp = setup_workspace();
    let prd = tmp.path().join("prd.md");
    fs::write(&prd, "## Goals\nShip the login flow.\n\n## Scope\nWeb only.\n").unwrap();

    awb(&tmp)
        .args(["project", "doc", "import", "prd", prd.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 section(s)"));
    awb(&tmp)
        .args(["project", "doc", "section", "prd", "scope", "Web and mobile."])
        .assert()
        .success();

    awb(&tmp)
        .args(["export", "doc", "prd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Product Requirements Document"))
        .stdout(predicate::str::contains("Web and mobile."));

    awb(&tmp)
        .args(["export", "doc", "brd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no BRD document"));
}

// ============================================================================
// Epic and Story Tests
// ============================================================================

#[test]
fn test_epic_ids_are_sequential() {
    let tmp = setup_workspace();
    assert_eq!(create(&tmp, &["epic", "new", "First"]), "EPIC-001");
    assert_eq!(create(&tmp, &["epic", "new", "Second"]), "EPIC-002");

    awb(&tmp)
        .args(["epic", "delete", "2", "--yes"])
        .assert()
        .success();
    assert_eq!(create(&tmp, &["epic", "new", "Third"]), "EPIC-002");
}

#[test]
fn test_deleted_story_shows_as_not_found() {
    let tmp = setup_workspace();
    create(&tmp, &["epic", "new", "Checkout"]);
    let story = create(
        &tmp,
        &["story", "new", "--role", "buyer", "--action", "pay", "--epic", "EPIC-001"],
    );

    awb(&tmp)
        .args(["epic", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("As a buyer, I want pay"));
    let before = stdout_of(&tmp, &["epic", "show", "1", "-f", "json"]);
    assert!(before.contains(&story));

    awb(&tmp)
        .args(["story", "delete", &story, "--yes"])
        .assert()
        .success();

    let after = stdout_of(&tmp, &["epic", "show", "1", "-f", "json"]);
    assert_eq!(before, after);

    awb(&tmp)
        .args(["epic", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{} (not found)", story)));

    awb(&tmp)
        .args(["status", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linkedStories"));

    awb(&tmp)
        .args(["epic", "unlink", "1", &story])
        .assert()
        .success();
    awb(&tmp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("All references resolve"));
}

#[test]
fn test_story_move_reorders_backlog() {
    let tmp = setup_workspace();
    let a = create_story(&tmp, "first", "1");
    let b = create_story(&tmp, "second", "1");
    let c = create_story(&tmp, "third", "1");

    awb(&tmp).args(["story", "move", &c, "1"]).assert().success();

    let ids = stdout_of(&tmp, &["story", "list", "-f", "id"]);
    let ids: Vec<&str> = ids.lines().collect();
    assert_eq!(ids, vec![c.as_str(), a.as_str(), b.as_str()]);
}

// ============================================================================
// Sprint Tests
// ============================================================================

#[test]
fn test_board_move_updates_story_status() {
    let tmp = setup_workspace();
    let story = create_story(&tmp, "export reports", "5");
    let item = create(&tmp, &["sprint", "add", "--story", &story]);

    awb(&tmp)
        .args(["sprint", "move", &item, "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("story is now Done"));

    let json = stdout_of(&tmp, &["story", "show", &story, "-f", "json"]);
    assert!(json.contains("\"status\": \"Done\""));

    awb(&tmp)
        .args(["sprint", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5/5 done"));

    awb(&tmp)
        .args(["story", "edit", &story, "--status", "to do"])
        .assert()
        .success();
    let json = stdout_of(&tmp, &["story", "show", &story, "-f", "json"]);
    assert!(json.contains("\"status\": \"To Do\""));

    let board = stdout_of(&tmp, &["sprint", "show", "-f", "json"]);
    assert!(board.contains("\"column\": \"done\""));
    awb(&tmp)
        .args(["sprint", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5/5 done"));
}

#[test]
fn test_huge_point_totals_do_not_crash() {
    let tmp = setup_workspace();
    create_story(&tmp, "big one", "3000000000");
    create_story(&tmp, "big two", "3000000000");
    create(&tmp, &["sprint", "add", "--text", "Huge", "--points", "4000000000"]);
    create(&tmp, &["sprint", "add", "--text", "Huger", "--points", "4000000000"]);

    awb(&tmp).args(["sprint", "show"]).assert().success();
    awb(&tmp).args(["sprint", "list"]).assert().success();
    awb(&tmp).arg("status").assert().success();
}

#[test]
fn test_default_sprint_is_stable() {
    let tmp = setup_workspace();
    let first = stdout_of(&tmp, &["sprint", "list", "-f", "id"]);
    let second = stdout_of(&tmp, &["sprint", "list", "-f", "id"]);
    assert_eq!(first.lines().count(), 1);
    assert_eq!(first, second);
}

#[test]
fn test_completed_sprint_is_read_only() {
    let tmp = setup_workspace();
    let item = create(&tmp, &["sprint", "add", "--text", "Spike", "--points", "2"]);

    awb(&tmp).args(["sprint", "start"]).assert().success();
    awb(&tmp).args(["sprint", "complete"]).assert().success();

    awb(&tmp)
        .args(["sprint", "move", &item, "review"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));

    awb(&tmp)
        .args(["sprint", "comment", &item, "Carried over"])
        .assert()
        .success();
}

#[test]
fn test_deleting_last_sprint_leaves_fresh_one() {
    let tmp = setup_workspace();
    awb(&tmp)
        .args(["sprint", "delete", "Sprint 1", "--yes"])
        .assert()
        .success();
    let out = stdout_of(&tmp, &["sprint", "list", "-f", "csv"]);
    assert_eq!(out.lines().count(), 2);
    assert!(out.contains("Sprint 1"));
}

#[test]
fn test_planner_import_and_capacity() {
    let tmp = setup_workspace();
    awb(&tmp)
        .args(["team", "add", "Alice", "--capacity", "6"])
        .assert()
        .success();
    let story = create_story(&tmp, "search", "3");
    let plan = create(&tmp, &["sprint", "plan", "add", "--story", &story]);
    awb(&tmp).args(["sprint", "plan", "commit", &plan]).assert().success();

    awb(&tmp)
        .args(["sprint", "plan", "capacity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("48.0 h"))
        .stdout(predicate::str::contains("18.0 h (3 pts)"));

    awb(&tmp)
        .args(["sprint", "plan", "import"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 item(s)"));
    awb(&tmp)
        .args(["sprint", "plan", "import"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 item(s)"));
}

// ============================================================================
// Retro, Decision, Risk and RACI Tests
// ============================================================================

#[test]
fn test_retro_seed_and_markdown_export() {
    let tmp = setup_workspace();
    let done = create(&tmp, &["sprint", "add", "--text", "Shipped search", "--points", "3"]);
    create(&tmp, &["sprint", "add", "--text", "Flaky CI", "--points", "1"]);
    awb(&tmp).args(["sprint", "move", &done, "done"]).assert().success();

    create(&tmp, &["retro", "new", "--date", "2024-05-10", "--sprint", "Sprint 1"]);
    awb(&tmp)
        .args(["retro", "seed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 went well, 1 didn't go well"));
    awb(&tmp)
        .args(["retro", "action", "Fix CI", "--owner", "Bob"])
        .assert()
        .success();

    awb(&tmp)
        .args(["export", "retro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Retrospective - 2024-05-10"))
        .stdout(predicate::str::contains("Shipped search"))
        .stdout(predicate::str::contains("| Open | Fix CI | Bob | - |"));
}

#[test]
fn test_decision_supersede_requires_remarks() {
    let tmp = setup_workspace();
    let id = create(&tmp, &["decision", "new", "Use Postgres", "-r", "Team knows it"]);

    awb(&tmp)
        .args(["decision", "status", &id, "superseded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("remarks"));
    awb(&tmp)
        .args(["decision", "status", &id, "superseded", "-m", "Moved to SQLite"])
        .assert()
        .success();

    awb(&tmp)
        .args(["export", "decisions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Remarks:** Moved to SQLite"));
}

#[test]
fn test_risk_ratings_are_validated() {
    let tmp = setup_workspace();
    awb(&tmp)
        .args(["risk", "new", "Vendor lock-in", "-p", "6", "-i", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 1 and 5"));

    let id = create(&tmp, &["risk", "new", "Vendor lock-in", "-p", "4", "-i", "4"]);
    awb(&tmp)
        .args(["risk", "reassess", &id, "2", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score 16 → 4"));
    awb(&tmp)
        .args(["risk", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("16 → 4"));
}

#[test]
fn test_raci_validation_and_csv() {
    let tmp = setup_workspace();
    awb(&tmp).args(["raci", "add-task", "Design"]).assert().success();
    awb(&tmp)
        .args(["raci", "add-stakeholder", "Alice", "--role", "PM"])
        .assert()
        .success();

    awb(&tmp)
        .args(["raci", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no Accountable"));

    awb(&tmp)
        .args(["raci", "assign", "design", "alice", "A"])
        .assert()
        .success();
    awb(&tmp)
        .args(["export", "csv", "raci"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task,Alice (PM)"))
        .stdout(predicate::str::contains("Design,A"));
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_stories_csv_to_file() {
    let tmp = setup_workspace();
    create(
        &tmp,
        &["story", "new", "--role", "admin, owner", "--action", "manage users"],
    );
    let out = tmp.path().join("stories.csv");
    awb(&tmp)
        .args(["export", "csv", "stories", "-o", out.to_str().unwrap()])
        .assert()
        .success();

    let csv = fs::read_to_string(out).unwrap();
    assert!(csv.starts_with("ID,Role,Action,Benefit"));
    assert!(csv.contains("\"admin, owner\""));
}
