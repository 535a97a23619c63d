//! Diff/apply engine tests
//!
//! Preview and commit go through one code path; commits re-check every
//! planned file against the hash it was planned from.

use cfgscope_core::apply::{execute, ChangeState};
use cfgscope_core::cfgscope_scanner::{ClaudePaths, Scope};
use cfgscope_core::config::{ConfigScope, McpOps, McpServerConfig};
use cfgscope_core::diff::OperationKind;
use cfgscope_core::{ApplyError, ApplyMode, ChangeSet, PendingChange};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_preview_and_commit_agree() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("notes.md");
    fs::write(&existing, "one\ntwo\n").unwrap();

    let mut set = ChangeSet::new("Edit notes");
    set.write(&existing, "one\nthree\n").unwrap();
    set.write(dir.path().join("new/todo.md"), "- ship\n").unwrap();

    let mut pending = PendingChange::new(set.clone());
    let preview = pending.preview().unwrap();
    assert_eq!(fs::read_to_string(&existing).unwrap(), "one\ntwo\n");
    assert_eq!(preview.count(OperationKind::Modify), 1);
    assert_eq!(preview.count(OperationKind::Create), 1);

    let committed = pending.commit().unwrap();
    assert_eq!(pending.state(), ChangeState::Committed);
    assert_eq!(committed.operations, preview.operations);
    assert_eq!(committed.terminal_output, preview.terminal_output);
    assert_eq!(fs::read_to_string(&existing).unwrap(), "one\nthree\n");
    assert_eq!(fs::read_to_string(dir.path().join("new/todo.md")).unwrap(), "- ship\n");

    // Replaying the same plan now conflicts: the files moved on
    assert!(matches!(
        execute(&set, ApplyMode::Write),
        Err(ApplyError::CommitConflict { index: 0, .. })
    ));
}

#[test]
fn test_external_edit_after_preview_conflicts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{}\n").unwrap();

    let mut set = ChangeSet::new("Update settings");
    set.write(&path, "{\"a\": 1}\n").unwrap();
    let mut pending = PendingChange::new(set);
    pending.preview().unwrap();

    fs::write(&path, "{\"b\": 2}\n").unwrap();
    let err = pending.commit().unwrap_err();
    assert!(matches!(err, ApplyError::CommitConflict { index: 0, ref path } if path.ends_with("settings.json")));
    assert_eq!(pending.state(), ChangeState::Aborted);
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"b\": 2}\n");
}

#[test]
fn test_commit_without_preview_is_invalid() {
    let dir = TempDir::new().unwrap();
    let mut set = ChangeSet::new("Create");
    set.write(dir.path().join("a.md"), "a\n").unwrap();

    let mut pending = PendingChange::new(set);
    assert!(matches!(pending.commit(), Err(ApplyError::InvalidState { .. })));
    assert!(!dir.path().join("a.md").exists());
    assert_eq!(pending.state(), ChangeState::Drafted);
}

#[test]
fn test_move_server_from_project_to_user() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    let project = dir.path().join("app");
    fs::create_dir_all(&project).unwrap();
    fs::create_dir_all(&home).unwrap();
    fs::write(
        project.join(".mcp.json"),
        r#"{"mcpServers": {"db": {"command": "db-server", "args": []}}}"#,
    )
    .unwrap();

    let ops = McpOps::new(ClaudePaths::with_home(&home), Some(project.clone()));
    let dry = ops
        .move_server("db", Some(ConfigScope::Project), ConfigScope::User, false, true)
        .unwrap();
    let preview = dry.preview.unwrap();
    assert_eq!(preview.count(OperationKind::Delete), 1);
    assert_eq!(
        preview.count(OperationKind::Create) + preview.count(OperationKind::Modify),
        1
    );
    assert!(project.join(".mcp.json").exists());

    ops.move_server("db", Some(ConfigScope::Project), ConfigScope::User, false, false)
        .unwrap();
    let listed = ops.list().unwrap();
    assert!(listed.iter().all(|s| !(s.name == "db" && s.scope == Scope::Project)));
    assert!(listed.iter().any(|s| s.name == "db" && s.scope == Scope::User));
    assert!(!project.join(".mcp.json").exists());

    // Adding it back to the project is independent of the user copy
    ops.add("db", ConfigScope::Project, McpServerConfig::stdio("db-server", vec![]), false)
        .unwrap();
    assert_eq!(ops.list().unwrap().iter().filter(|s| s.name == "db").count(), 2);
}
