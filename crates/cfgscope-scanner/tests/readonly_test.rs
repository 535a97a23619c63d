//! Non-destructive guarantee tests
//!
//! Scanning must never create, modify or remove anything on disk, including
//! files it fails to parse.

use cfgscope_scanner::hash::hash_file;
use cfgscope_scanner::{ClaudePaths, Scanner};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Relative path -> content hash (directories map to "dir")
fn snapshot(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .to_string();
            let value = if entry.file_type().is_file() {
                hash_file(entry.path()).unwrap()
            } else {
                "dir".to_string()
            };
            (relative, value)
        })
        .collect()
}

fn create_fixture() -> (TempDir, TempDir) {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    let user = home.path().join(".claude");
    fs::create_dir_all(user.join("skills/my-skill")).unwrap();
    fs::write(
        user.join("skills/my-skill/SKILL.md"),
        "---\nname: my-skill\ndescription: Test skill\n---\n\nInstructions here.\n",
    )
    .unwrap();
    fs::write(
        user.join("settings.json"),
        r#"{"permissions": {"allow": ["Bash(*)"]}, "hooks": {}}"#,
    )
    .unwrap();
    fs::write(
        home.path().join(".claude.json"),
        r#"{"mcpServers": {"fs": {"command": "npx"}}}"#,
    )
    .unwrap();

    let claude = project.path().join(".claude");
    fs::create_dir_all(claude.join("commands")).unwrap();
    fs::create_dir_all(claude.join("agents")).unwrap();
    fs::write(
        claude.join("commands/my-command.md"),
        "---\ndescription: Test command\n---\n\nDo $ARGUMENTS\n",
    )
    .unwrap();
    fs::write(
        claude.join("agents/my-agent.md"),
        "---\nname: my-agent\ndescription: Test agent\ntools: Read, Write\n---\n\nAgent.\n",
    )
    .unwrap();
    fs::write(claude.join("settings.local.json"), r#"{"env": {"DEBUG": "true"}}"#).unwrap();
    fs::write(project.path().join("CLAUDE.md"), "# Project\n").unwrap();
    fs::write(project.path().join(".mcp.json"), "{ broken").unwrap();

    (home, project)
}

#[test]
fn test_scan_leaves_disk_untouched() {
    let (home, project) = create_fixture();
    let home_before = snapshot(home.path());
    let project_before = snapshot(project.path());

    let scanner = Scanner::new(ClaudePaths::with_home(home.path())).with_managed(true);
    let inventory = scanner.scan_all(&[project.path().to_path_buf()]);
    assert_eq!(inventory.projects.len(), 1);
    assert!(!inventory.warnings.is_empty());

    assert_eq!(home_before, snapshot(home.path()));
    assert_eq!(project_before, snapshot(project.path()));
}

#[test]
fn test_repeated_scans_are_stable() {
    let (home, project) = create_fixture();
    let scanner = Scanner::new(ClaudePaths::with_home(home.path()));
    let inputs = [project.path().to_path_buf()];

    let first = scanner.scan_all(&inputs);
    let second = scanner.scan_all(&inputs);

    let records = |inv: &cfgscope_scanner::Inventory| serde_json::to_value(inv.records()).unwrap();
    assert_eq!(records(&first), records(&second));
    assert_eq!(first.warnings.len(), second.warnings.len());
}

#[test]
fn test_missing_roots_are_not_created() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    let _ = Scanner::new(ClaudePaths::with_home(home.path()))
        .with_managed(true)
        .scan_all(&[project.path().to_path_buf()]);

    assert_eq!(fs::read_dir(home.path()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(project.path()).unwrap().count(), 0);
}
