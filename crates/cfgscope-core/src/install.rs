//! Installing profiles into projects and as local plugins
//!
//! A profile can be copied straight into a project's `.claude` directory,
//! or packaged as a plugin and registered in `installed_plugins.json`.
//! Either way the result is a [`ChangeSet`], so installs are previewed and
//! committed like any other change.
//!
//! Plugin layout:
//!
//! ```text
//! <plugin>/.claude-plugin/plugin.json
//! <plugin>/skills/<name>/...    <plugin>/commands/...    <plugin>/agents/...
//! <plugin>/.mcp.json            <plugin>/hooks/hooks.json
//! ```

use crate::apply::{ApplyError, ChangeSet, PendingChange};
use crate::config::{ConfigError, McpDocument, McpSlot};
use crate::diff::DiffPreview;
use crate::profile::{Profile, ProfileError, ProfileFiles, ProfileStore, StorageError, ToolType};
use cfgscope_scanner::hash::hash_dir;
use cfgscope_scanner::ClaudePaths;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Marketplace name plugins are registered under
pub const PLUGIN_MARKETPLACE: &str = "cfgscope";

const PLUGIN_PREFIX: &str = "cfgscope-profile-";

/// Length of the content-hash prefix used as plugin version
const VERSION_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("Project not registered: {0}")]
    ProjectNotFound(Uuid),

    #[error("Invalid JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },
}

impl From<StorageError> for InstallError {
    fn from(err: StorageError) -> Self {
        Self::Profile(err.into())
    }
}

impl From<crate::storage::DatabaseError> for InstallError {
    fn from(err: crate::storage::DatabaseError) -> Self {
        Self::Profile(err.into())
    }
}

/// Where a profile is being installed as a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
enum PluginTarget {
    User,
    Project(PathBuf),
}

/// A plugin install waiting to be previewed and committed
#[derive(Debug)]
pub struct PlannedInstall {
    pub pending: PendingChange,
    pub plugin_id: String,
    pub version: String,
    pub install_path: PathBuf,
}

/// Result of a plugin install
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    pub plugin_id: String,
    /// Key in `installed_plugins.json` (`<plugin_id>@cfgscope`)
    pub plugin_key: String,
    pub version: String,
    pub install_path: PathBuf,
    pub committed: bool,
    pub preview: DiffPreview,
}

impl PlannedInstall {
    /// Preview, then commit unless `dry_run`
    pub fn run(mut self, dry_run: bool) -> Result<InstallOutcome, InstallError> {
        let preview = self.pending.preview()?;
        let (preview, committed) = if dry_run {
            self.pending.abort()?;
            (preview, false)
        } else {
            (self.pending.commit()?, true)
        };
        Ok(InstallOutcome {
            plugin_key: plugin_key(&self.plugin_id),
            plugin_id: self.plugin_id,
            version: self.version,
            install_path: self.install_path,
            committed,
            preview,
        })
    }
}

/// `cfgscope-profile-<name>`, lowercased with runs of other characters
/// collapsed to a dash
#[must_use]
pub fn plugin_id_for(profile_name: &str) -> String {
    let mut slug = String::new();
    for c in profile_name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        format!("{PLUGIN_PREFIX}profile")
    } else {
        format!("{PLUGIN_PREFIX}{slug}")
    }
}

#[must_use]
pub fn plugin_key(plugin_id: &str) -> String {
    format!("{plugin_id}@{PLUGIN_MARKETPLACE}")
}

/// MCP servers and hook groups collected from a profile
#[derive(Default)]
struct JsonTools {
    servers: Vec<(String, Value)>,
    /// `(trigger, group)` pairs
    hooks: Vec<(String, Value)>,
}

/// Plan copying file tools into `dest_root` (a `.claude` dir or plugin
/// root) and collect the JSON ones for the caller to merge
fn plan_tools(
    set: &mut ChangeSet,
    files: &ProfileFiles,
    profile: &Profile,
    dest_root: &Path,
) -> Result<JsonTools, InstallError> {
    let mut json_tools = JsonTools::default();

    for tool in &profile.tool_refs {
        let stored = files.tool_path(tool.tool_type, &tool.name)?;
        if !stored.exists() {
            set.warn(format!(
                "{} '{}' has no stored content and was skipped",
                tool.tool_type, tool.name
            ));
            continue;
        }

        match tool.tool_type {
            ToolType::Skill | ToolType::Command | ToolType::Agent => {
                let rel = stored.strip_prefix(files.root()).unwrap_or(&stored);
                let dest = dest_root.join(rel);
                if tool.tool_type == ToolType::Skill {
                    if dest.is_dir() && hash_dir(&dest).ok() != hash_dir(&stored).ok() {
                        set.warn(format!(
                            "skill '{}' in {} is replaced by the profile's",
                            tool.name,
                            dest.display()
                        ));
                    }
                    set.write_tree(&stored, &dest)?;
                } else {
                    let content = fs::read_to_string(&stored).map_err(|e| ApplyError::io(&stored, &e))?;
                    if set.current_text(&dest)?.is_some_and(|existing| existing != content) {
                        set.warn(format!(
                            "{} '{}' in {} is replaced by the profile's",
                            tool.tool_type,
                            tool.name,
                            dest.display()
                        ));
                    }
                    set.write(dest, content)?;
                }
            }
            ToolType::Mcp => {
                let value = files.read_json(ToolType::Mcp, &tool.name)?;
                json_tools.servers.push((tool.name.clone(), value));
            }
            ToolType::Hook => {
                let value = files.read_json(ToolType::Hook, &tool.name)?;
                let trigger = value
                    .get("trigger")
                    .and_then(Value::as_str)
                    .unwrap_or_else(|| tool.name.split(':').next().unwrap_or(&tool.name))
                    .to_string();
                let group = value.get("group").cloned().unwrap_or(Value::Null);
                json_tools.hooks.push((trigger, group));
            }
        }
    }

    Ok(json_tools)
}

fn parse_json(path: &Path, text: Option<String>) -> Result<Map<String, Value>, InstallError> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(InstallError::Json {
            path: path.to_path_buf(),
            message: "Expected JSON object".to_string(),
        }),
        Err(e) => Err(InstallError::Json {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

fn render_json(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}

/// Add hook groups under `hooks.<trigger>` of the JSON file at `path`,
/// skipping groups already present
fn merge_hooks(set: &mut ChangeSet, path: &Path, hooks: &[(String, Value)]) -> Result<(), InstallError> {
    if hooks.is_empty() {
        return Ok(());
    }
    let mut root = parse_json(path, set.current_text(path)?)?;
    let hooks_obj = root
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(hooks_obj) = hooks_obj.as_object_mut() else {
        return Err(InstallError::Json {
            path: path.to_path_buf(),
            message: "'hooks' is not an object".to_string(),
        });
    };

    for (trigger, group) in hooks {
        let groups = hooks_obj
            .entry(trigger.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Some(groups) = groups.as_array_mut() {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
    }

    set.write(path, render_json(&Value::Object(root)))?;
    Ok(())
}

/// Merge MCP servers into the document at `slot`; an existing server with
/// different settings is replaced with a warning
fn merge_servers(set: &mut ChangeSet, slot: &McpSlot, servers: &[(String, Value)]) -> Result<(), InstallError> {
    if servers.is_empty() {
        return Ok(());
    }
    let text = set.current_text(&slot.path)?;
    let mut doc = McpDocument::parse(&slot.path, text.as_deref())?;
    for (name, value) in servers {
        if let Some(existing) = doc.get(slot, name) {
            if existing == value {
                continue;
            }
            set.warn(format!(
                "MCP server '{name}' in {} is replaced by the profile's",
                slot.path.display()
            ));
        }
        doc.insert(slot, name, value.clone())?;
    }
    set.write(&slot.path, doc.render()?)?;
    Ok(())
}

/// Plan installing `profile` directly into `project`
///
/// Skills, commands and agents are copied into `.claude/`, MCP servers are
/// merged into `.mcp.json`, hook groups into `.claude/settings.json`, and
/// the stored CLAUDE.md (if any) replaces the project's.
pub fn plan_profile_install(
    store: &ProfileStore,
    profile: &Profile,
    project: &Path,
) -> Result<ChangeSet, InstallError> {
    let files = store.files(profile.id);
    let mut set = ChangeSet::new(format!(
        "Install profile '{}' into {}",
        profile.name,
        project.display()
    ))
    .for_profile(profile.id);

    let json_tools = plan_tools(&mut set, &files, profile, &ClaudePaths::project_claude_dir(project))?;
    merge_servers(&mut set, &McpSlot::in_file(ClaudePaths::project_mcp_path(project)), &json_tools.servers)?;
    merge_hooks(&mut set, &ClaudePaths::project_settings_path(project), &json_tools.hooks)?;

    if profile.has_claude_md {
        let src = files.claude_md_path();
        match fs::read_to_string(&src) {
            Ok(content) => {
                let dest = project.join("CLAUDE.md");
                if set.current_text(&dest)?.is_some_and(|t| t != content) {
                    set.warn("CLAUDE.md is replaced by the profile's");
                }
                set.write(dest, content)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                set.warn("Profile CLAUDE.md is missing from storage and was skipped");
            }
            Err(e) => return Err(ApplyError::io(&src, &e).into()),
        }
    }

    debug!(profile = %profile.name, changes = set.changes.len(), "planned profile install");
    Ok(set)
}

/// Install `id` into `project` now, or only preview with `dry_run`
pub fn install_profile(
    store: &ProfileStore,
    id: Uuid,
    project: &Path,
    dry_run: bool,
) -> Result<DiffPreview, InstallError> {
    let profile = store.get(id)?;
    let mut pending = PendingChange::new(plan_profile_install(store, &profile, project)?);
    let preview = pending.preview()?;
    if dry_run {
        pending.abort()?;
        return Ok(preview);
    }
    let committed = pending.commit()?;
    info!(profile = %profile.name, project = %project.display(), "installed profile");
    Ok(committed)
}

fn plan_plugin(store: &ProfileStore, profile: &Profile, target: &PluginTarget) -> Result<PlannedInstall, InstallError> {
    let claude = store.paths().claude();
    let files = store.files(profile.id);
    let plugin_id = plugin_id_for(&profile.name);
    let key = plugin_key(&plugin_id);
    let version: String = files.content_hash()?.chars().take(VERSION_LEN).collect();

    let (install_path, settings_path, scope, project_path) = match target {
        PluginTarget::User => (
            claude.plugins_dir().join(PLUGIN_MARKETPLACE).join(&plugin_id),
            claude.user_settings_path(),
            "user",
            None,
        ),
        PluginTarget::Project(project) => (
            ClaudePaths::project_claude_dir(project).join("plugins").join(&plugin_id),
            ClaudePaths::project_settings_path(project),
            "project",
            Some(project.clone()),
        ),
    };

    let mut set = ChangeSet::new(format!("Install profile '{}' as plugin {key}", profile.name)).for_profile(profile.id);
    // Files rewritten unchanged drop out of the plan; the rest of a previous
    // install is deleted
    set.delete_tree(&install_path)?;

    let manifest = json!({
        "name": plugin_id,
        "version": version,
        "description": profile.description.clone().unwrap_or_default(),
    });
    set.write(
        install_path.join(".claude-plugin").join("plugin.json"),
        render_json(&manifest),
    )?;

    let json_tools = plan_tools(&mut set, &files, profile, &install_path)?;
    if !json_tools.servers.is_empty() {
        let servers: Map<String, Value> = json_tools.servers.into_iter().collect();
        set.write(install_path.join(".mcp.json"), render_json(&json!({ "mcpServers": servers })))?;
    }
    if !json_tools.hooks.is_empty() {
        let mut by_trigger: Map<String, Value> = Map::new();
        for (trigger, group) in json_tools.hooks {
            if let Some(groups) = by_trigger
                .entry(trigger)
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
            {
                groups.push(group);
            }
        }
        set.write(
            install_path.join("hooks").join("hooks.json"),
            render_json(&json!({ "hooks": by_trigger })),
        )?;
    }
    if profile.has_claude_md {
        set.warn("CLAUDE.md is not part of plugins and was not installed");
    }

    register_plugin(&mut set, claude, &key, &install_path, &version, scope, project_path.as_deref())?;
    enable_plugin(&mut set, &settings_path, &key)?;

    Ok(PlannedInstall {
        pending: PendingChange::new(set),
        plugin_id,
        version,
        install_path,
    })
}

/// Add or replace this install's entry in `installed_plugins.json`
fn register_plugin(
    set: &mut ChangeSet,
    claude: &ClaudePaths,
    key: &str,
    install_path: &Path,
    version: &str,
    scope: &str,
    project_path: Option<&Path>,
) -> Result<(), InstallError> {
    let registry_path = claude.installed_plugins_path();
    let mut root = parse_json(&registry_path, set.current_text(&registry_path)?)?;
    root.entry("version").or_insert(json!(2));
    let plugins = root
        .entry("plugins")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(plugins) = plugins.as_object_mut() else {
        return Err(InstallError::Json {
            path: registry_path,
            message: "'plugins' is not an object".to_string(),
        });
    };

    let project_str = project_path.map(|p| p.display().to_string());
    let same_install = |entry: &Value| {
        entry.get("scope").and_then(Value::as_str) == Some(scope)
            && entry.get("projectPath").and_then(Value::as_str) == project_str.as_deref()
    };

    let installs = plugins
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let installs = installs.as_array_mut().ok_or_else(|| InstallError::Json {
        path: registry_path.clone(),
        message: format!("'{key}' is not an array"),
    })?;

    let previous = installs.iter().find(|&e| same_install(e)).cloned();
    if previous
        .as_ref()
        .is_some_and(|p| p.get("version").and_then(Value::as_str) == Some(version))
    {
        // Same content already registered
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    let installed_at = previous
        .as_ref()
        .and_then(|p| p.get("installedAt").cloned())
        .unwrap_or_else(|| json!(now));
    let mut entry = json!({
        "scope": scope,
        "installPath": install_path.display().to_string(),
        "version": version,
        "installedAt": installed_at,
        "lastUpdated": now,
    });
    if let (Some(project), Some(obj)) = (project_str.as_deref(), entry.as_object_mut()) {
        obj.insert("projectPath".to_string(), json!(project));
    }

    installs.retain(|e| !same_install(e));
    installs.push(entry);

    set.write(&registry_path, render_json(&Value::Object(root)))?;
    Ok(())
}

fn enable_plugin(set: &mut ChangeSet, settings_path: &Path, key: &str) -> Result<(), InstallError> {
    let mut root = parse_json(settings_path, set.current_text(settings_path)?)?;
    let enabled = root
        .entry("enabledPlugins")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(enabled) = enabled.as_object_mut() else {
        return Err(InstallError::Json {
            path: settings_path.to_path_buf(),
            message: "'enabledPlugins' is not an object".to_string(),
        });
    };
    if enabled.get(key) == Some(&Value::Bool(true)) {
        return Ok(());
    }
    enabled.insert(key.to_string(), Value::Bool(true));
    set.write(settings_path, render_json(&Value::Object(root)))?;
    Ok(())
}

/// Plan installing profile `id` as a user-level plugin
pub fn plan_install_to_user(store: &ProfileStore, id: Uuid) -> Result<PlannedInstall, InstallError> {
    let profile = store.get(id)?;
    plan_plugin(store, &profile, &PluginTarget::User)
}

/// Install profile `id` as a plugin under `~/.claude/plugins/cfgscope/`
pub fn install_profile_to_user(store: &ProfileStore, id: Uuid, dry_run: bool) -> Result<InstallOutcome, InstallError> {
    let outcome = plan_install_to_user(store, id)?.run(dry_run)?;
    if outcome.committed {
        info!(plugin = %outcome.plugin_key, version = %outcome.version, "installed profile plugin for user");
    }
    Ok(outcome)
}

/// Plan installing profile `id` as a plugin of a registered project
pub fn plan_assign_as_plugin(store: &ProfileStore, project_id: Uuid, id: Uuid) -> Result<PlannedInstall, InstallError> {
    let project = store
        .projects()
        .get(project_id)?
        .ok_or(InstallError::ProjectNotFound(project_id))?;
    let profile = store.get(id)?;
    plan_plugin(store, &profile, &PluginTarget::Project(project.path))
}

/// Install profile `id` as a plugin in the project's `.claude/plugins` and
/// record the assignment
pub fn assign_profile_as_plugin(
    store: &ProfileStore,
    project_id: Uuid,
    id: Uuid,
    dry_run: bool,
) -> Result<InstallOutcome, InstallError> {
    let project = store
        .projects()
        .get(project_id)?
        .ok_or(InstallError::ProjectNotFound(project_id))?;
    let outcome = plan_assign_as_plugin(store, project_id, id)?.run(dry_run)?;
    if outcome.committed {
        store.assign_project(id, &project.path)?;
        info!(plugin = %outcome.plugin_key, project = %project.path.display(), "assigned profile plugin");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::OperationKind;
    use crate::paths::DataPaths;
    use crate::profile::ProfileSource;
    use cfgscope_scanner::{plugins::PluginInventory, Scope};
    use tempfile::TempDir;

    fn setup() -> (TempDir, ProfileStore, PathBuf) {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::with_root(dir.path());
        let project = dir.path().join("app");
        fs::create_dir_all(project.join(".claude/skills/review")).unwrap();
        fs::create_dir_all(project.join(".claude/commands")).unwrap();
        fs::write(
            project.join(".claude/skills/review/SKILL.md"),
            "---\nname: review\ndescription: Reviews code\n---\nReview.\n",
        )
        .unwrap();
        fs::write(
            project.join(".claude/commands/ship.md"),
            "---\ndescription: Ship it\n---\nShip.\n",
        )
        .unwrap();
        fs::write(
            project.join(".mcp.json"),
            r#"{"mcpServers": {"db": {"command": "db-server", "args": ["--port", "5432"]}}}"#,
        )
        .unwrap();
        fs::write(project.join("CLAUDE.md"), "# App\n").unwrap();
        let store = ProfileStore::open(paths).unwrap();
        (dir, store, project)
    }

    #[test]
    fn test_plugin_id_sanitizes_name() {
        assert_eq!(plugin_id_for("Rust Dev"), "cfgscope-profile-rust-dev");
        assert_eq!(plugin_id_for("a__b!!c "), "cfgscope-profile-a-b-c");
        assert_eq!(plugin_id_for("***"), "cfgscope-profile-profile");
    }

    #[test]
    fn test_install_into_new_project() {
        let (dir, store, project) = setup();
        let (profile, _) = store
            .create("web", ProfileSource::Project(project), None)
            .unwrap();
        let target = dir.path().join("other");
        fs::create_dir_all(&target).unwrap();

        let preview = install_profile(&store, profile.id, &target, true).unwrap();
        assert!(!target.join(".claude").exists());
        assert_eq!(preview.count(OperationKind::Create), 4);

        install_profile(&store, profile.id, &target, false).unwrap();
        assert!(target.join(".claude/skills/review/SKILL.md").is_file());
        assert!(target.join(".claude/commands/ship.md").is_file());
        assert_eq!(fs::read_to_string(target.join("CLAUDE.md")).unwrap(), "# App\n");
        let mcp: Value = serde_json::from_str(&fs::read_to_string(target.join(".mcp.json")).unwrap()).unwrap();
        assert_eq!(mcp["mcpServers"]["db"]["command"], "db-server");

        // Installing again changes nothing
        let again = install_profile(&store, profile.id, &target, true).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_install_to_user_registers_plugin() {
        let (_dir, store, project) = setup();
        let (profile, _) = store
            .create("Web Dev", ProfileSource::Project(project), None)
            .unwrap();

        let outcome = install_profile_to_user(&store, profile.id, false).unwrap();
        assert_eq!(outcome.plugin_id, "cfgscope-profile-web-dev");
        assert_eq!(outcome.version.len(), VERSION_LEN);
        assert!(outcome.committed);
        assert!(outcome.preview.warnings.iter().any(|w| w.contains("CLAUDE.md")));

        let claude = store.paths().claude();
        let mut warnings = Vec::new();
        let inventory = PluginInventory::scan(claude, &mut warnings);
        let plugin = inventory.find("cfgscope-profile-web-dev@cfgscope").unwrap();
        assert!(plugin.enabled);
        assert_eq!(plugin.version, outcome.version);
        assert_eq!(plugin.manifest.name, "cfgscope-profile-web-dev");
        assert_eq!(plugin.contents.skills.len(), 1);
        assert_eq!(plugin.contents.skills[0].scope, Scope::Plugin(outcome.plugin_key.clone()));
        assert_eq!(plugin.contents.mcp.as_ref().unwrap().servers.len(), 1);

        // Same content: nothing to do
        let again = install_profile_to_user(&store, profile.id, true).unwrap();
        assert!(again.preview.is_empty());
    }

    #[test]
    fn test_assign_as_plugin_records_assignment() {
        let (_dir, store, project) = setup();
        let (profile, _) = store
            .create("web", ProfileSource::Project(project.clone()), None)
            .unwrap();
        let registered = store.projects().get_or_create(&project).unwrap();

        let dry = assign_profile_as_plugin(&store, registered.id, profile.id, true).unwrap();
        assert!(!dry.committed);
        assert!(!dry.install_path.exists());

        let outcome = assign_profile_as_plugin(&store, registered.id, profile.id, false).unwrap();
        assert_eq!(outcome.install_path, project.join(".claude/plugins/cfgscope-profile-web"));
        assert!(outcome.install_path.join(".claude-plugin/plugin.json").is_file());

        let settings: Value = serde_json::from_str(
            &fs::read_to_string(project.join(".claude/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["enabledPlugins"]["cfgscope-profile-web@cfgscope"], true);

        let assigned = store.projects().get(registered.id).unwrap().unwrap();
        assert_eq!(assigned.assigned_profile_id, Some(profile.id));
        assert_eq!(store.get(profile.id).unwrap().assigned_projects.len(), 1);
    }

    #[test]
    fn test_assign_unknown_project() {
        let (_dir, store, _project) = setup();
        let (profile, _) = store.create("empty", ProfileSource::Empty, None).unwrap();
        assert!(matches!(
            assign_profile_as_plugin(&store, Uuid::new_v4(), profile.id, true),
            Err(InstallError::ProjectNotFound(_))
        ));
    }
}
