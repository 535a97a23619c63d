//! Installed plugin scanner
//!
//! Reads `~/.claude/plugins/installed_plugins.json` and scans each install
//! directory as a [`Scope::Plugin`] root.

use crate::error::{ScanError, ScanWarning};
use crate::inventory::ScopeContents;
use crate::paths::ClaudePaths;
use crate::scope::files::read_optional;
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Plugin inventory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginInventory {
    /// Installed plugins, sorted by key then install scope
    #[serde(default)]
    pub installed: Vec<InstalledPlugin>,
}

/// `installed_plugins.json` (version 2): `"name@marketplace"` -> installs
#[derive(Debug, Deserialize)]
struct RawInstalledPlugins {
    #[serde(default)]
    plugins: BTreeMap<String, Vec<RawPluginInstall>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPluginInstall {
    #[serde(default = "default_install_scope")]
    scope: String,
    project_path: Option<String>,
    install_path: String,
    #[serde(default)]
    version: Option<String>,
    installed_at: Option<String>,
    last_updated: Option<String>,
}

fn default_install_scope() -> String {
    "user".to_string()
}

impl PluginInventory {
    /// Scan installed plugins
    ///
    /// A missing registry is an empty inventory. An unreadable registry is
    /// also empty, with a warning.
    pub fn scan(paths: &ClaudePaths, warnings: &mut Vec<ScanWarning>) -> Self {
        let registry_path = paths.installed_plugins_path();
        let Some(raw) = read_optional(&registry_path, warnings, |_, content| {
            serde_json::from_str::<RawInstalledPlugins>(content).map_err(ScanError::JsonParse)
        }) else {
            return Self::default();
        };

        let enabled_map = read_enabled_plugins(&paths.user_settings_path());

        let mut installed = Vec::new();
        for (key, installs) in raw.plugins {
            let (id, marketplace) = split_plugin_key(&key);
            for install in installs {
                let path = PathBuf::from(&install.install_path);
                let plugin_scope = Scope::Plugin(key.clone());
                let contents = crate::scope::read_scope(&path, &plugin_scope, warnings);
                let manifest = read_manifest(&path).unwrap_or_else(|| PluginManifest {
                    name: id.clone(),
                    version: None,
                    description: None,
                    author: None,
                });

                installed.push(InstalledPlugin {
                    id: id.clone(),
                    marketplace: marketplace.clone(),
                    version: install.version.unwrap_or_else(|| "unknown".to_string()),
                    install_scope: install.scope.parse().unwrap_or(Scope::User),
                    enabled: enabled_map.get(&key).copied().unwrap_or(true),
                    path,
                    manifest,
                    installed_at: install.installed_at,
                    last_updated: install.last_updated,
                    project_path: install.project_path.map(PathBuf::from),
                    contents,
                });
            }
        }

        installed.sort_by(|a, b| {
            a.key()
                .cmp(&b.key())
                .then_with(|| a.install_scope.cmp(&b.install_scope))
        });
        tracing::debug!(count = installed.len(), "scanned installed plugins");
        Self { installed }
    }

    /// Find an installed plugin by `name@marketplace` key or bare name
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&InstalledPlugin> {
        self.installed
            .iter()
            .find(|p| p.key() == key || p.id == key)
    }
}

/// Split `name@marketplace` into its parts
#[must_use]
pub fn split_plugin_key(key: &str) -> (String, Option<String>) {
    match key.split_once('@') {
        Some((name, marketplace)) => (name.to_string(), Some(marketplace.to_string())),
        None => (key.to_string(), None),
    }
}

/// `enabledPlugins` from user settings; plugins absent from the map are enabled
fn read_enabled_plugins(settings_path: &Path) -> BTreeMap<String, bool> {
    let Ok(content) = std::fs::read_to_string(settings_path) else {
        return BTreeMap::new();
    };
    let Ok(settings) = serde_json::from_str::<serde_json::Value>(&content) else {
        return BTreeMap::new();
    };
    settings
        .get("enabledPlugins")
        .and_then(serde_json::Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(key, value)| value.as_bool().map(|enabled| (key.clone(), enabled)))
                .collect()
        })
        .unwrap_or_default()
}

/// Manifest at `.claude-plugin/plugin.json`, or the legacy `plugin.json`
fn read_manifest(install_path: &Path) -> Option<PluginManifest> {
    [
        install_path.join(".claude-plugin").join("plugin.json"),
        install_path.join("plugin.json"),
    ]
    .iter()
    .find_map(|path| {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    })
}

/// One installation of a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPlugin {
    /// Plugin name
    pub id: String,
    pub marketplace: Option<String>,
    pub version: String,
    /// Scope the plugin was installed into (user or project)
    pub install_scope: Scope,
    pub enabled: bool,
    /// Install directory
    pub path: PathBuf,
    pub manifest: PluginManifest,
    pub installed_at: Option<String>,
    pub last_updated: Option<String>,
    /// Owning project for project-scoped installs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,
    /// Definitions the plugin ships
    #[serde(default)]
    pub contents: ScopeContents,
}

impl InstalledPlugin {
    /// `name@marketplace`, or the bare name for marketplace-less installs
    #[must_use]
    pub fn key(&self) -> String {
        match &self.marketplace {
            Some(marketplace) => format!("{}@{marketplace}", self.id),
            None => self.id.clone(),
        }
    }

    /// The scope its definitions belong to
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::Plugin(self.key())
    }

    /// User installs are visible everywhere; project installs only in their project
    #[must_use]
    pub fn visible_from(&self, project: Option<&Path>) -> bool {
        match (&self.install_scope, &self.project_path, project) {
            (Scope::Project | Scope::Local, Some(owner), Some(current)) => {
                normalize(owner) == normalize(current)
            }
            (Scope::Project | Scope::Local, _, _) => false,
            _ => true,
        }
    }
}

fn normalize(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    s.trim_end_matches('/').to_string()
}

/// Plugin manifest (`plugin.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
}

/// Author information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_registry(home: &Path, install: &Path, extra: &str) {
        let plugins = home.join(".claude/plugins");
        fs::create_dir_all(&plugins).unwrap();
        let registry = format!(
            r#"{{"version": 2, "plugins": {{"tidy@tools": [{{"scope": "user", "installPath": "{}", "version": "1.2.0"}}]{extra}}}}}"#,
            install.display()
        );
        fs::write(plugins.join("installed_plugins.json"), registry).unwrap();
    }

    #[test]
    fn test_scan_installed_plugin() {
        let home = TempDir::new().unwrap();
        let install = TempDir::new().unwrap();
        fs::create_dir_all(install.path().join("skills/format")).unwrap();
        fs::write(
            install.path().join("skills/format/SKILL.md"),
            "---\nname: format\ndescription: Formats code\n---\n",
        )
        .unwrap();
        fs::create_dir_all(install.path().join(".claude-plugin")).unwrap();
        fs::write(
            install.path().join(".claude-plugin/plugin.json"),
            r#"{"name": "tidy", "version": "1.2.0", "description": "Tidy things"}"#,
        )
        .unwrap();
        write_registry(home.path(), install.path(), "");

        let mut warnings = Vec::new();
        let inventory = PluginInventory::scan(&ClaudePaths::with_home(home.path()), &mut warnings);
        assert_eq!(inventory.installed.len(), 1);
        let plugin = &inventory.installed[0];
        assert_eq!(plugin.key(), "tidy@tools");
        assert!(plugin.enabled);
        assert_eq!(plugin.contents.skills.len(), 1);
        assert_eq!(plugin.contents.skills[0].scope, Scope::Plugin("tidy@tools".into()));
        assert_eq!(plugin.manifest.description.as_deref(), Some("Tidy things"));
    }

    #[test]
    fn test_disabled_plugin() {
        let home = TempDir::new().unwrap();
        let install = TempDir::new().unwrap();
        write_registry(home.path(), install.path(), "");
        fs::write(
            home.path().join(".claude/settings.json"),
            r#"{"enabledPlugins": {"tidy@tools": false}}"#,
        )
        .unwrap();

        let mut warnings = Vec::new();
        let inventory = PluginInventory::scan(&ClaudePaths::with_home(home.path()), &mut warnings);
        assert!(!inventory.installed[0].enabled);
    }

    #[test]
    fn test_corrupt_registry_warns() {
        let home = TempDir::new().unwrap();
        let plugins = home.path().join(".claude/plugins");
        fs::create_dir_all(&plugins).unwrap();
        fs::write(plugins.join("installed_plugins.json"), "{ not json").unwrap();

        let mut warnings = Vec::new();
        let inventory = PluginInventory::scan(&ClaudePaths::with_home(home.path()), &mut warnings);
        assert!(inventory.installed.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_split_plugin_key() {
        assert_eq!(
            split_plugin_key("tidy@tools"),
            ("tidy".to_string(), Some("tools".to_string()))
        );
        assert_eq!(split_plugin_key("solo"), ("solo".to_string(), None));
    }
}
