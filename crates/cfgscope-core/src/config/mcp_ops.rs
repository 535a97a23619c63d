//! MCP server CRUD operations
//!
//! Every mutation is planned as a [`ChangeSet`] against the current files
//! and runs through the apply engine, so `dry_run` and a real run share one
//! code path. A project `.mcp.json` left without servers is deleted; the
//! user-level `~/.claude.json` never is.

use super::error::{ConfigError, ConfigResult};
use super::mcp::{McpDocument, McpServerConfig, McpServerUpdate, McpSlot};
use super::ops::{OperationResult, OperationType, PlannedOperation};
use super::scope::ConfigScope;
use crate::apply::{ChangeSet, PendingChange};
use crate::util::validate_name;
use cfgscope_scanner::plugins::PluginInventory;
use cfgscope_scanner::settings::McpServer;
use cfgscope_scanner::{ClaudePaths, Scope};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One MCP server as listed
#[derive(Debug, Clone, Serialize)]
pub struct McpServerItem {
    pub name: String,
    pub scope: Scope,
    /// File the server is defined in
    pub path: PathBuf,
    pub config: McpServerConfig,
}

impl From<&McpServer> for McpServerConfig {
    fn from(server: &McpServer) -> Self {
        Self {
            transport: server.transport,
            command: server.command.clone(),
            args: server.args.clone(),
            env: server.env.clone(),
            url: server.url.clone(),
        }
    }
}

/// MCP operations for the user scope and, optionally, one project
pub struct McpOps {
    paths: ClaudePaths,
    project: Option<PathBuf>,
}

impl McpOps {
    #[must_use]
    pub fn new(paths: ClaudePaths, project: Option<PathBuf>) -> Self {
        let project = project.as_deref().map(ClaudePaths::canonical_project);
        Self { paths, project }
    }

    fn slot(&self, scope: ConfigScope) -> ConfigResult<McpSlot> {
        McpSlot::for_scope(scope, &self.paths, self.project.as_deref())
    }

    /// Scopes searched when none is given, most specific first
    fn search_scopes(&self) -> Vec<ConfigScope> {
        if self.project.is_some() {
            vec![ConfigScope::Local, ConfigScope::Project, ConfigScope::User]
        } else {
            vec![ConfigScope::User]
        }
    }

    fn read(set: &ChangeSet, slot: &McpSlot) -> ConfigResult<McpDocument> {
        let text = set.current_text(&slot.path)?;
        McpDocument::parse(&slot.path, text.as_deref())
    }

    /// Servers across user, local, project and managed scopes, then enabled
    /// plugins visible from the project
    pub fn list(&self) -> ConfigResult<Vec<McpServerItem>> {
        let mut items = Vec::new();
        for scope in self.search_scopes().into_iter().rev() {
            items.extend(self.list_scope(scope)?);
        }
        if self.paths.managed_mcp_path().exists() {
            items.extend(self.list_scope(ConfigScope::Managed)?);
        }
        items.extend(self.plugin_servers());
        Ok(items)
    }

    fn plugin_servers(&self) -> Vec<McpServerItem> {
        let mut warnings = Vec::new();
        let inventory = PluginInventory::scan(&self.paths, &mut warnings);
        for warning in &warnings {
            debug!(path = %warning.path.display(), message = %warning.message, "plugin scan warning");
        }

        inventory
            .installed
            .iter()
            .filter(|p| p.enabled && p.visible_from(self.project.as_deref()))
            .flat_map(|plugin| {
                let scope = plugin.scope();
                plugin.contents.mcp.iter().flat_map(move |mcp| {
                    let scope = scope.clone();
                    mcp.servers.iter().map(move |server| McpServerItem {
                        name: server.name.clone(),
                        scope: scope.clone(),
                        path: mcp.path.clone(),
                        config: server.into(),
                    })
                })
            })
            .collect()
    }

    /// Servers defined directly in one scope; entries that are not valid
    /// server definitions are skipped
    pub fn list_scope(&self, scope: ConfigScope) -> ConfigResult<Vec<McpServerItem>> {
        let slot = self.slot(scope)?;
        let doc = Self::read(&ChangeSet::default(), &slot)?;
        let items = doc
            .names(&slot)
            .into_iter()
            .filter_map(|name| {
                let config = doc
                    .get(&slot, &name)
                    .and_then(|v| serde_json::from_value::<McpServerConfig>(v.clone()).ok())
                    .filter(|c| c.validate().is_ok())?;
                Some(McpServerItem {
                    name,
                    scope: scope.to_scope(),
                    path: slot.path.clone(),
                    config,
                })
            })
            .collect();
        Ok(items)
    }

    /// The single writable scope holding `name`
    fn find_server(&self, name: &str, scope: Option<ConfigScope>) -> ConfigResult<ConfigScope> {
        let candidates = match scope {
            Some(s) => vec![s],
            None => self.search_scopes(),
        };

        let mut found = Vec::new();
        for s in candidates {
            let slot = self.slot(s)?;
            if Self::read(&ChangeSet::default(), &slot)?.get(&slot, name).is_some() {
                found.push(s);
            }
        }

        match found.as_slice() {
            [] => Err(ConfigError::ItemNotFound {
                name: name.to_string(),
            }),
            [only] => Ok(*only),
            _ => Err(ConfigError::AmbiguousItem {
                name: name.to_string(),
                scopes: found.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    fn store(set: &mut ChangeSet, slot: &McpSlot, doc: &McpDocument) -> ConfigResult<()> {
        if doc.is_empty() && slot.removable_when_empty() {
            set.delete(&slot.path)?;
        } else {
            set.write(&slot.path, doc.render()?)?;
        }
        Ok(())
    }

    pub fn plan_add(&self, name: &str, scope: ConfigScope, config: McpServerConfig) -> ConfigResult<PlannedOperation> {
        validate_name(name).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        config.validate().map_err(ConfigError::ValidationError)?;
        scope.require_writable()?;

        let slot = self.slot(scope)?;
        let mut set = ChangeSet::new(format!("Add MCP server '{name}' to {scope} scope"));
        let mut doc = Self::read(&set, &slot)?;
        if doc.get(&slot, name).is_some() {
            return Err(ConfigError::ItemExists {
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
        let value = serde_json::to_value(&config).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        doc.insert(&slot, name, value)?;
        Self::store(&mut set, &slot, &doc)?;

        Ok(planned(set, OperationType::Add, name, scope))
    }

    pub fn add(&self, name: &str, scope: ConfigScope, config: McpServerConfig, dry_run: bool) -> ConfigResult<OperationResult> {
        self.plan_add(name, scope, config)?.run(dry_run)
    }

    pub fn plan_remove(&self, name: &str, scope: Option<ConfigScope>) -> ConfigResult<PlannedOperation> {
        let scope = self.find_server(name, scope)?;
        scope.require_writable()?;

        let slot = self.slot(scope)?;
        let mut set = ChangeSet::new(format!("Remove MCP server '{name}' from {scope} scope"));
        let mut doc = Self::read(&set, &slot)?;
        doc.remove(&slot, name);
        Self::store(&mut set, &slot, &doc)?;

        Ok(planned(set, OperationType::Remove, name, scope))
    }

    pub fn remove(&self, name: &str, scope: Option<ConfigScope>, dry_run: bool) -> ConfigResult<OperationResult> {
        self.plan_remove(name, scope)?.run(dry_run)
    }

    /// Move a server's definition verbatim to another scope
    ///
    /// With `force`, an existing server of the same name in the target is
    /// replaced.
    pub fn plan_move(
        &self,
        name: &str,
        from: Option<ConfigScope>,
        to: ConfigScope,
        force: bool,
    ) -> ConfigResult<PlannedOperation> {
        to.require_writable()?;
        let from = self.find_server(name, from)?;
        from.require_writable()?;
        if from == to {
            return Err(ConfigError::ValidationError(format!(
                "Server '{name}' is already in {to} scope"
            )));
        }

        let source = self.slot(from)?;
        let target = self.slot(to)?;
        let mut set = ChangeSet::new(format!("Move MCP server '{name}' from {from} to {to} scope"));

        let mut source_doc = Self::read(&set, &source)?;
        let value = source_doc
            .remove(&source, name)
            .ok_or_else(|| ConfigError::ItemNotFound {
                name: name.to_string(),
            })?;
        Self::store(&mut set, &source, &source_doc)?;

        let mut target_doc = Self::read(&set, &target)?;
        if target_doc.get(&target, name).is_some() {
            if !force {
                return Err(ConfigError::ItemExists {
                    name: name.to_string(),
                    scope: to.to_string(),
                });
            }
            set.warn(format!("Replacing existing '{name}' in {to} scope"));
        }
        if to == ConfigScope::Project && value.get("env").is_some_and(|env| env.as_object().is_some_and(|e| !e.is_empty())) {
            set.warn(format!(
                "Environment values of '{name}' will be written to the shared {}",
                target.path.display()
            ));
        }
        target_doc.insert(&target, name, value)?;
        Self::store(&mut set, &target, &target_doc)?;

        Ok(planned(set, OperationType::Move, name, to))
    }

    pub fn move_server(
        &self,
        name: &str,
        from: Option<ConfigScope>,
        to: ConfigScope,
        force: bool,
        dry_run: bool,
    ) -> ConfigResult<OperationResult> {
        self.plan_move(name, from, to, force)?.run(dry_run)
    }

    pub fn plan_update(
        &self,
        name: &str,
        scope: Option<ConfigScope>,
        update: McpServerUpdate,
    ) -> ConfigResult<PlannedOperation> {
        let scope = self.find_server(name, scope)?;
        scope.require_writable()?;

        let slot = self.slot(scope)?;
        let mut set = ChangeSet::new(format!("Update MCP server '{name}' in {scope} scope"));
        let mut doc = Self::read(&set, &slot)?;
        let current = doc
            .get(&slot, name)
            .cloned()
            .ok_or_else(|| ConfigError::ItemNotFound {
                name: name.to_string(),
            })?;
        let mut config: McpServerConfig =
            serde_json::from_value(current).map_err(|e| ConfigError::json(&slot.path, e))?;
        update.apply(&mut config);
        config.validate().map_err(ConfigError::ValidationError)?;

        let value = serde_json::to_value(&config).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        doc.remove(&slot, name);
        doc.insert(&slot, name, value)?;
        Self::store(&mut set, &slot, &doc)?;

        Ok(planned(set, OperationType::Update, name, scope))
    }

    pub fn update(
        &self,
        name: &str,
        scope: Option<ConfigScope>,
        update: McpServerUpdate,
        dry_run: bool,
    ) -> ConfigResult<OperationResult> {
        self.plan_update(name, scope, update)?.run(dry_run)
    }

    #[must_use]
    pub fn project(&self) -> Option<&Path> {
        self.project.as_deref()
    }
}

fn planned(set: ChangeSet, operation: OperationType, name: &str, scope: ConfigScope) -> PlannedOperation {
    PlannedOperation {
        pending: PendingChange::new(set),
        operation,
        name: name.to_string(),
        scope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::OperationKind;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        paths: ClaudePaths,
        project: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let project = dir.path().join("app");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&project).unwrap();
        Fixture {
            paths: ClaudePaths::with_home(&home),
            project,
            _dir: dir,
        }
    }

    impl Fixture {
        fn ops(&self) -> McpOps {
            McpOps::new(self.paths.clone(), Some(self.project.clone()))
        }
    }

    #[test]
    fn test_list_empty() {
        let fx = fixture();
        assert!(fx.ops().list().unwrap().is_empty());
    }

    #[test]
    fn test_add_dry_run_writes_nothing() {
        let fx = fixture();
        let result = fx
            .ops()
            .add("db", ConfigScope::Project, McpServerConfig::stdio("pg", vec![]), true)
            .unwrap();
        assert!(result.success);
        assert!(!result.committed);
        assert!(result.diff.as_deref().is_some_and(|d| d.contains("+    \"db\"")));
        assert!(!fx.project.join(".mcp.json").exists());
    }

    #[test]
    fn test_add_then_duplicate() {
        let fx = fixture();
        let ops = fx.ops();
        ops.add("db", ConfigScope::Project, McpServerConfig::stdio("pg", vec![]), false)
            .unwrap();
        let listed = ops.list_scope(ConfigScope::Project).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].config.command.as_deref(), Some("pg"));

        let err = ops
            .add("db", ConfigScope::Project, McpServerConfig::stdio("pg", vec![]), false)
            .unwrap_err();
        assert_eq!(err.code(), "ITEM_EXISTS");
    }

    #[test]
    fn test_remove_deletes_emptied_project_file() {
        let fx = fixture();
        fs::write(
            fx.project.join(".mcp.json"),
            r#"{"mcpServers":{"db":{"command":"pg"}}}"#,
        )
        .unwrap();
        let result = fx.ops().remove("db", None, false).unwrap();
        assert_eq!(result.scope, ConfigScope::Project);
        assert!(!fx.project.join(".mcp.json").exists());
    }

    #[test]
    fn test_user_file_is_kept_when_emptied() {
        let fx = fixture();
        let user = fx.paths.user_mcp_path();
        fs::write(&user, r#"{"mcpServers":{"fs":{"command":"fs-mcp"}},"theme":"dark"}"#).unwrap();
        fx.ops().remove("fs", Some(ConfigScope::User), false).unwrap();
        let content = fs::read_to_string(&user).unwrap();
        assert!(content.contains("theme"));
        assert!(!content.contains("fs-mcp"));
    }

    #[test]
    fn test_ambiguous_without_scope() {
        let fx = fixture();
        fs::write(fx.project.join(".mcp.json"), r#"{"mcpServers":{"db":{"command":"a"}}}"#).unwrap();
        fs::write(fx.paths.user_mcp_path(), r#"{"mcpServers":{"db":{"command":"b"}}}"#).unwrap();
        let err = fx.ops().remove("db", None, true).unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousItem { .. }));
        assert!(fx.ops().remove("db", Some(ConfigScope::User), true).is_ok());
    }

    #[test]
    fn test_move_between_user_and_local_shares_one_file() {
        let fx = fixture();
        fs::write(fx.paths.user_mcp_path(), r#"{"mcpServers":{"db":{"command":"pg"}}}"#).unwrap();
        let result = fx
            .ops()
            .move_server("db", Some(ConfigScope::User), ConfigScope::Local, false, false)
            .unwrap();
        let preview = result.preview.unwrap();
        assert_eq!(preview.operations.len(), 1);
        assert_eq!(preview.count(OperationKind::Modify), 1);

        let local = fx.ops().list_scope(ConfigScope::Local).unwrap();
        assert_eq!(local.len(), 1);
        assert!(fx.ops().list_scope(ConfigScope::User).unwrap().is_empty());
    }

    #[test]
    fn test_move_conflict_needs_force() {
        let fx = fixture();
        fs::write(fx.project.join(".mcp.json"), r#"{"mcpServers":{"db":{"command":"a"}}}"#).unwrap();
        fs::write(fx.paths.user_mcp_path(), r#"{"mcpServers":{"db":{"command":"b"}}}"#).unwrap();
        let ops = fx.ops();
        assert!(matches!(
            ops.move_server("db", Some(ConfigScope::Project), ConfigScope::User, false, true),
            Err(ConfigError::ItemExists { .. })
        ));
        let result = ops
            .move_server("db", Some(ConfigScope::Project), ConfigScope::User, true, true)
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_update_env() {
        let fx = fixture();
        fs::write(
            fx.project.join(".mcp.json"),
            r#"{"mcpServers":{"db":{"command":"pg","env":{"OLD":"1"}}}}"#,
        )
        .unwrap();
        let update = McpServerUpdate {
            remove_env: Some(vec!["OLD".into()]),
            add_args: Some(vec!["--ro".into()]),
            ..McpServerUpdate::default()
        };
        fx.ops().update("db", None, update, false).unwrap();
        let item = &fx.ops().list_scope(ConfigScope::Project).unwrap()[0];
        assert!(item.config.env.is_empty());
        assert_eq!(item.config.args, vec!["--ro"]);
    }

    #[test]
    fn test_managed_scope_is_read_only() {
        let fx = fixture();
        assert!(matches!(
            fx.ops().add("x", ConfigScope::Managed, McpServerConfig::stdio("x", vec![]), true),
            Err(ConfigError::ManagedScope)
        ));
    }
}
