//! CLI integration tests using assert_cmd
//!
//! Every test points `--home` and `--data-dir` at temp directories so the
//! real Claude configuration is never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Sandbox {
    _dir: TempDir,
    home: std::path::PathBuf,
    data: std::path::PathBuf,
    root: std::path::PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        let home = root.join("home");
        let data = root.join("data");
        fs::create_dir_all(&home).unwrap();
        Self {
            _dir: dir,
            home,
            data,
            root,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cfgscope").expect("Failed to find cfgscope binary");
        cmd.arg("--home").arg(&self.home).arg("--data-dir").arg(&self.data);
        cmd
    }

    fn project(&self, name: &str) -> std::path::PathBuf {
        let path = self.root.join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_help_command() {
    Command::cargo_bin("cfgscope")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Claude configuration inventory"));
}

#[test]
fn test_profile_help() {
    Sandbox::new()
        .cmd()
        .args(["profile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage profiles"));
}

#[test]
fn test_profile_list_empty() {
    Sandbox::new()
        .cmd()
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles found"));
}

#[test]
fn test_profile_show_not_found() {
    Sandbox::new()
        .cmd()
        .args(["profile", "show", "nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile not found"));
}

#[test]
fn test_profile_create_validates_name() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox
        .cmd()
        .args(["profile", "create", "../bad-name", "--source"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("path separator"));

    sandbox
        .cmd()
        .args(["profile", "create", ".hidden", "--source"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot start with dot"));
}

#[test]
fn test_profile_create_then_show() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    write(
        &project.join(".claude/commands/release.md"),
        "---\ndescription: Cut a release\n---\nRelease it.\n",
    );

    sandbox
        .cmd()
        .args(["profile", "create", "release-kit", "-d", "Release tooling", "--source"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created profile 'release-kit'"))
        .stdout(predicate::str::contains("Captured 1 tools (0 failed)"));

    sandbox
        .cmd()
        .args(["profile", "show", "release-kit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Description: Release tooling"))
        .stdout(predicate::str::contains("release [project, tracked]"));

    sandbox
        .cmd()
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1 tools, 0 projects]"));
}

#[test]
fn test_scan_writes_json_inventory() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    write(
        &project.join(".claude/skills/lint/SKILL.md"),
        "---\nname: lint\ndescription: Lints\n---\nLint.\n",
    );
    let output = sandbox.root.join("inventory.json");

    sandbox
        .cmd()
        .arg("scan")
        .arg(&project)
        .args(["--format", "json", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote inventory to"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(json.get("projects").is_some());
    assert!(fs::read_to_string(&output).unwrap().contains("lint"));
}

#[test]
fn test_mcp_add_dry_run_writes_nothing() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox
        .cmd()
        .args(["mcp", "add", "db", "--command", "db-server", "--dry-run", "-p"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run - no changes made."));

    assert!(!project.join(".mcp.json").exists());
}

#[test]
fn test_mcp_add_list_and_move() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox
        .cmd()
        .args(["mcp", "add", "db", "--command", "db-server", "--args", "serve", "--args", "5432", "-p"])
        .arg(&project)
        .assert()
        .success();
    assert!(fs::read_to_string(project.join(".mcp.json")).unwrap().contains("db-server"));

    sandbox
        .cmd()
        .args(["mcp", "list", "--json", "-p"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"));

    sandbox
        .cmd()
        .args(["mcp", "move", "db", "--to", "user", "-p"])
        .arg(&project)
        .assert()
        .success();

    assert!(!project.join(".mcp.json").exists());
    let user = fs::read_to_string(sandbox.home.join(".claude.json")).unwrap();
    assert!(user.contains("db-server"));
}

#[test]
fn test_mcp_add_requires_command_for_stdio() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox
        .cmd()
        .args(["mcp", "add", "db", "-p"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires 'command'"));
}

#[test]
fn test_skill_create() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox
        .cmd()
        .args(["skill", "create", "review", "--description", "Reviews code", "--body", "Review it.", "-p"])
        .arg(&project)
        .assert()
        .success();

    let skill = fs::read_to_string(project.join(".claude/skills/review/SKILL.md")).unwrap();
    assert!(skill.contains("description: \"Reviews code\""));
    assert!(skill.contains("Review it."));

    // A second create collides
    sandbox
        .cmd()
        .args(["skill", "create", "review", "--description", "Again", "--body", "Again.", "-p"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_tool_add_and_remove_command() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    let source = sandbox.root.join("deploy.md");
    write(&source, "---\ndescription: Deploy\n---\nDeploy.\n");

    sandbox
        .cmd()
        .args(["tool", "add", "command", "ops:deploy"])
        .arg(&source)
        .arg("-p")
        .arg(&project)
        .assert()
        .success();
    let installed = project.join(".claude/commands/ops/deploy.md");
    assert!(installed.exists());

    sandbox
        .cmd()
        .args(["tool", "remove", "command", "ops:deploy", "-p"])
        .arg(&project)
        .assert()
        .success();
    assert!(!installed.exists());
}

#[test]
fn test_profile_install_dry_run() {
    let sandbox = Sandbox::new();
    let source = sandbox.project("source");
    write(
        &source.join(".claude/skills/deploy/SKILL.md"),
        "---\nname: deploy\ndescription: Deploys\n---\nDeploy.\n",
    );
    let target = sandbox.project("target");

    sandbox
        .cmd()
        .args(["profile", "create", "deployers", "--source"])
        .arg(&source)
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["profile", "install", "deployers", "--dry-run", "--target"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run - no changes made."));
    assert!(!target.join(".claude").exists());

    sandbox
        .cmd()
        .args(["profile", "install", "deployers", "--target"])
        .arg(&target)
        .assert()
        .success();
    assert!(target.join(".claude/skills/deploy/SKILL.md").exists());

    sandbox
        .cmd()
        .args(["profile", "install", "deployers", "--target"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes needed."));
}

#[test]
fn test_discover_lists_projects() {
    let sandbox = Sandbox::new();
    let workspace = sandbox.project("work");
    write(&workspace.join("alpha/CLAUDE.md"), "# Alpha\n");
    fs::create_dir_all(workspace.join("beta")).unwrap();

    sandbox
        .cmd()
        .arg("discover")
        .arg(&workspace)
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta").not());
}

#[test]
fn test_assign_then_unassign_project() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox.cmd().args(["profile", "create", "team", "--empty"]).assert().success();
    sandbox
        .cmd()
        .args(["profile", "assign", "team"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned 'team'"));

    sandbox
        .cmd()
        .arg("projects")
        .assert()
        .success()
        .stdout(predicate::str::contains("app").and(predicate::str::contains("team")));

    sandbox
        .cmd()
        .args(["profile", "unassign"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unassigned"));
    sandbox
        .cmd()
        .args(["profile", "unassign"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("has no assigned profile"));
}

#[test]
fn test_local_mcp_with_relative_project_path() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    sandbox
        .cmd()
        .current_dir(&project)
        .args(["mcp", "add", "db", "--command", "db-server", "--scope", "local", "-p", "."])
        .assert()
        .success();

    let user: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(sandbox.home.join(".claude.json")).unwrap()).unwrap();
    let key = fs::canonicalize(&project).unwrap().to_string_lossy().to_string();
    assert!(user["projects"][key.as_str()]["mcpServers"]["db"].is_object());
    assert!(user["projects"].get(".").is_none());

    sandbox
        .cmd()
        .current_dir(&project)
        .args(["scan", ".", "--format", "records"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db-server"));
}
