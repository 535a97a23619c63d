//! Scanner integration tests
//!
//! Builds fake homes and projects on disk and runs the full inventory
//! pipeline against them.

use cfgscope_scanner::{ClaudePaths, Inventory, Scanner, Scope, ToolKind, WarningKind};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_skill(root: &Path, name: &str) {
    write(
        &root.join("skills").join(name).join("SKILL.md"),
        &format!("---\nname: {name}\ndescription: {name} skill\n---\n\nBody.\n"),
    );
}

fn write_command(root: &Path, name: &str) {
    write(
        &root.join("commands").join(format!("{name}.md")),
        "---\ndescription: A command\n---\n\nDo $ARGUMENTS\n",
    );
}

fn write_plugin(home: &Path, key: &str, enabled: bool) -> PathBuf {
    let install = home.join(".claude/plugins/cache").join(key);
    fs::create_dir_all(&install).unwrap();
    let registry = home.join(".claude/plugins/installed_plugins.json");
    let mut plugins = fs::read_to_string(&registry)
        .ok()
        .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
        .unwrap_or_else(|| serde_json::json!({"version": 2, "plugins": {}}));
    plugins["plugins"][key] = serde_json::json!([{
        "scope": "user",
        "installPath": install.to_string_lossy(),
        "version": "1.0.0"
    }]);
    write(&registry, &serde_json::to_string_pretty(&plugins).unwrap());

    let settings_path = home.join(".claude/settings.json");
    let mut settings = fs::read_to_string(&settings_path)
        .ok()
        .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
        .unwrap_or_else(|| serde_json::json!({}));
    settings["enabledPlugins"][key] = serde_json::Value::Bool(enabled);
    write(&settings_path, &serde_json::to_string_pretty(&settings).unwrap());
    install
}

struct Fixture {
    home: TempDir,
    project: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            project: TempDir::new().unwrap(),
        }
    }

    fn user_root(&self) -> PathBuf {
        self.home.path().join(".claude")
    }

    fn project_root(&self) -> PathBuf {
        self.project.path().join(".claude")
    }

    fn managed_root(&self) -> PathBuf {
        self.home.path().join("managed")
    }

    fn scan(&self) -> Inventory {
        Scanner::new(ClaudePaths::with_home(self.home.path()))
            .with_managed(true)
            .scan_all(&[self.project.path().to_path_buf()])
    }
}

#[test]
fn test_name_in_one_scope_never_collides() {
    let fx = Fixture::new();
    write_skill(&fx.user_root(), "deploy");
    write_skill(&fx.project_root(), "review");
    write_command(&fx.project_root(), "deploy");

    let inventory = fx.scan();
    assert!(!inventory.collisions.has_collisions());
    assert_eq!(inventory.count(ToolKind::Skill), 2);
}

#[test]
fn test_user_and_project_skill_collide_project_wins() {
    let fx = Fixture::new();
    write_skill(&fx.user_root(), "deploy");
    write_skill(&fx.project_root(), "deploy");

    let inventory = fx.scan();
    assert_eq!(inventory.collisions.skills.len(), 1);
    let collision = &inventory.collisions.skills[0];
    assert_eq!(collision.name, "deploy");
    assert_eq!(collision.occurrences.len(), 2);
    assert_eq!(collision.winner_scope, Some(Scope::Project));
}

#[test]
fn test_collision_counts_distinct_scopes_and_picks_highest() {
    let fx = Fixture::new();
    write_skill(&fx.user_root(), "Lint");
    write_skill(&fx.project_root(), "lint");
    write_skill(&fx.managed_root(), "LINT");
    let plugin = write_plugin(fx.home.path(), "tools@market", true);
    write_skill(&plugin, "lint");

    let inventory = fx.scan();
    let collision = inventory.collisions.find(ToolKind::Skill, "lint").unwrap();
    assert_eq!(collision.occurrences.len(), 4);
    assert_eq!(collision.winner_scope, Some(Scope::Managed));
    assert_eq!(collision.name, "LINT");
    assert_eq!(
        collision.occurrences.last().unwrap().scope,
        Scope::Plugin("tools@market".into())
    );
}

#[test]
fn test_plugin_only_collision_breaks_tie_by_id() {
    let fx = Fixture::new();
    let b = write_plugin(fx.home.path(), "beta@market", true);
    let a = write_plugin(fx.home.path(), "alpha@market", true);
    write_command(&b, "format");
    write_command(&a, "format");

    let inventory = fx.scan();
    let collision = inventory.collisions.find(ToolKind::Command, "format").unwrap();
    assert_eq!(
        collision.winner_scope,
        Some(Scope::Plugin("alpha@market".into()))
    );
}

#[test]
fn test_disabled_plugin_does_not_collide() {
    let fx = Fixture::new();
    write_skill(&fx.user_root(), "deploy");
    let plugin = write_plugin(fx.home.path(), "off@market", false);
    write_skill(&plugin, "deploy");

    let inventory = fx.scan();
    assert!(!inventory.collisions.has_collisions());
    assert!(!inventory.plugins.installed[0].enabled);
}

#[test]
fn test_collisions_sorted_by_lowercase_name() {
    let fx = Fixture::new();
    for name in ["zeta", "Alpha", "mid"] {
        write_skill(&fx.user_root(), name);
        write_skill(&fx.project_root(), name);
    }

    let inventory = fx.scan();
    let names: Vec<&str> = inventory
        .collisions
        .skills
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "mid", "zeta"]);
}

#[test]
fn test_malformed_files_are_warnings() {
    let fx = Fixture::new();
    write_skill(&fx.project_root(), "good");
    write(
        &fx.project_root().join("skills/bad/SKILL.md"),
        "---\nname: bad\n---\n",
    );
    write(&fx.project.path().join(".mcp.json"), "{ not json");
    write(&fx.project_root().join("settings.json"), "[]oops");

    let inventory = fx.scan();
    let project = &inventory.projects[0];
    assert_eq!(project.project.skills.len(), 1);
    assert!(project.project.mcp.is_none());
    assert!(inventory.failures.is_empty());
    assert!(inventory.warnings.len() >= 3);
    assert!(inventory
        .warnings
        .iter()
        .all(|w| w.kind == WarningKind::Parse));
}

#[test]
fn test_project_local_scope() {
    let fx = Fixture::new();
    write(
        &fx.project_root().join("settings.local.json"),
        r#"{"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "notify"}]}]}}"#,
    );
    let key = ClaudePaths::local_mcp_key(fx.project.path());
    write(
        &fx.home.path().join(".claude.json"),
        &serde_json::json!({
            "mcpServers": {"global": {"command": "g"}},
            "projects": {key: {"mcpServers": {"mine": {"command": "m"}}}}
        })
        .to_string(),
    );

    let inventory = fx.scan();
    let records = inventory.records_for_project(Some(fx.project.path()));
    let local: Vec<_> = records.iter().filter(|r| r.scope == Scope::Local).collect();
    assert_eq!(local.len(), 2);
    assert!(local.iter().any(|r| r.kind == ToolKind::Hook));
    assert!(local
        .iter()
        .any(|r| r.kind == ToolKind::Mcp && r.name == "mine"));
    assert!(records
        .iter()
        .any(|r| r.scope == Scope::User && r.name == "global"));
}

#[test]
fn test_project_lookup_accepts_any_spelling_of_the_path() {
    let root = TempDir::new().unwrap();
    let home = root.path().join("home");
    let app = root.path().join("app");
    fs::create_dir_all(root.path().join("other")).unwrap();
    write_skill(&app.join(".claude"), "lint");
    let detour = root.path().join("other/../app");

    let inventory = Scanner::new(ClaudePaths::with_home(&home)).scan_all(&[detour.clone()]);
    assert_eq!(inventory.projects.len(), 1);
    assert!(inventory.project(&detour).is_some());
    assert!(inventory.project(&app).is_some());

    let records = inventory.records_for_project(Some(&detour));
    assert!(records
        .iter()
        .any(|r| r.name == "lint" && r.scope == Scope::Project));
}

#[test]
fn test_input_order_does_not_change_result() {
    let home = TempDir::new().unwrap();
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    write_skill(&a.path().join(".claude"), "shared");
    write_skill(&b.path().join(".claude"), "shared");
    write_skill(&home.path().join(".claude"), "shared");

    let scanner = Scanner::new(ClaudePaths::with_home(home.path()));
    let forward = scanner.scan_all(&[a.path().to_path_buf(), b.path().to_path_buf()]);
    let backward = scanner.scan_all(&[b.path().to_path_buf(), a.path().to_path_buf()]);

    let paths = |inv: &Inventory| inv.projects.iter().map(|p| p.path.clone()).collect::<Vec<_>>();
    assert_eq!(paths(&forward), paths(&backward));
    assert_eq!(
        serde_json::to_value(&forward.collisions).unwrap(),
        serde_json::to_value(&backward.collisions).unwrap()
    );
    let collision = &forward.collisions.skills[0];
    assert_eq!(collision.occurrences.len(), 2);
    assert_eq!(collision.winner_scope, Some(Scope::Project));
}

#[test]
fn test_json_output_round_trips() {
    let fx = Fixture::new();
    write_skill(&fx.user_root(), "deploy");
    write_skill(&fx.project_root(), "deploy");

    let inventory = fx.scan();
    let json = cfgscope_scanner::output::to_json(&inventory).unwrap();
    let parsed: Inventory = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.projects.len(), 1);
    assert_eq!(parsed.collisions.skills[0].winner_scope, Some(Scope::Project));
}
