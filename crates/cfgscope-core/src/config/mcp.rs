//! MCP server configuration and the JSON documents that hold it
//!
//! User servers sit under `mcpServers` in `~/.claude.json`, local servers
//! under `projects.<path>.mcpServers` in the same file, and project servers
//! in `.mcp.json` (wrapped, or flat in older files).

use super::error::{ConfigError, ConfigResult};
use super::scope::{require_project, ConfigScope};
use crate::util::pointer_token;
use cfgscope_scanner::settings::McpTransport;
use cfgscope_scanner::ClaudePaths;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SERVERS_KEY: &str = "mcpServers";

fn stdio() -> McpTransport {
    McpTransport::Stdio
}

/// MCP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    #[serde(rename = "type", default = "stdio")]
    pub transport: McpTransport,

    /// Command to execute (stdio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Endpoint (http, sse)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl McpServerConfig {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            transport: McpTransport::Stdio,
            command: Some(command.into()),
            args,
            env: BTreeMap::new(),
            url: None,
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: McpTransport::Http,
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            url: Some(url.into()),
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.transport {
            McpTransport::Stdio if self.command.is_none() => {
                Err("stdio transport requires 'command' field".into())
            }
            McpTransport::Http | McpTransport::Sse if self.url.is_none() => {
                Err(format!("{} transport requires 'url' field", self.transport))
            }
            _ => Ok(()),
        }
    }

    /// One-line summary: the command line, or the URL
    #[must_use]
    pub fn display(&self) -> String {
        match self.transport {
            McpTransport::Stdio => {
                let cmd = self.command.as_deref().unwrap_or("");
                if self.args.is_empty() {
                    cmd.to_string()
                } else {
                    format!("{cmd} {}", self.args.join(" "))
                }
            }
            McpTransport::Http | McpTransport::Sse => self.url.clone().unwrap_or_default(),
        }
    }
}

/// Changes to an existing server; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct McpServerUpdate {
    pub command: Option<String>,
    /// Replace all arguments
    pub args: Option<Vec<String>>,
    pub add_args: Option<Vec<String>>,
    /// Replace all environment variables
    pub env: Option<BTreeMap<String, String>>,
    pub add_env: Option<BTreeMap<String, String>>,
    pub remove_env: Option<Vec<String>>,
    pub url: Option<String>,
}

impl McpServerUpdate {
    pub fn apply(self, config: &mut McpServerConfig) {
        if let Some(command) = self.command {
            config.command = Some(command);
        }
        if let Some(args) = self.args {
            config.args = args;
        }
        if let Some(add_args) = self.add_args {
            config.args.extend(add_args);
        }
        if let Some(env) = self.env {
            config.env = env;
        }
        if let Some(add_env) = self.add_env {
            config.env.extend(add_env);
        }
        for key in self.remove_env.unwrap_or_default() {
            config.env.remove(&key);
        }
        if let Some(url) = self.url {
            config.url = Some(url);
        }
    }
}

/// Where one scope's servers live: a file and the key path to the
/// `mcpServers` object inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpSlot {
    pub path: PathBuf,
    keys: Vec<String>,
    /// Servers may also sit at the top level (older project files)
    flat_fallback: bool,
}

impl McpSlot {
    pub fn for_scope(scope: ConfigScope, paths: &ClaudePaths, project: Option<&Path>) -> ConfigResult<Self> {
        let slot = match scope {
            ConfigScope::User => Self {
                path: paths.user_mcp_path(),
                keys: vec![SERVERS_KEY.into()],
                flat_fallback: false,
            },
            ConfigScope::Local => Self {
                path: paths.user_mcp_path(),
                keys: vec![
                    "projects".into(),
                    ClaudePaths::local_mcp_key(require_project(project)?),
                    SERVERS_KEY.into(),
                ],
                flat_fallback: false,
            },
            ConfigScope::Project => Self {
                path: ClaudePaths::project_mcp_path(require_project(project)?),
                keys: vec![SERVERS_KEY.into()],
                flat_fallback: true,
            },
            ConfigScope::Managed => Self {
                path: paths.managed_mcp_path(),
                keys: vec![SERVERS_KEY.into()],
                flat_fallback: true,
            },
        };
        Ok(slot)
    }

    /// A standalone `.mcp.json`-style file, such as a plugin's
    #[must_use]
    pub fn in_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keys: vec![SERVERS_KEY.into()],
            flat_fallback: true,
        }
    }

    /// The user-level file is shared with unrelated settings and is never
    /// deleted, even when it holds no servers
    #[must_use]
    pub fn removable_when_empty(&self) -> bool {
        self.flat_fallback
    }
}

/// A parsed MCP-bearing JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct McpDocument {
    root: Value,
}

impl McpDocument {
    /// Parse `text`; absent content is an empty document
    pub fn parse(path: &Path, text: Option<&str>) -> ConfigResult<Self> {
        let root = match text {
            Some(text) if !text.trim().is_empty() => {
                serde_json::from_str::<Value>(text).map_err(|e| ConfigError::json(path, e))?
            }
            _ => Value::Object(Map::new()),
        };
        if !root.is_object() {
            return Err(ConfigError::json(path, "Expected JSON object"));
        }
        Ok(Self { root })
    }

    fn servers(&self, slot: &McpSlot) -> Option<&Map<String, Value>> {
        slot.keys
            .iter()
            .try_fold(&self.root, |value, key| value.get(key))
            .and_then(Value::as_object)
    }

    /// The raw entry for `name`
    #[must_use]
    pub fn get(&self, slot: &McpSlot, name: &str) -> Option<&Value> {
        self.servers(slot).and_then(|s| s.get(name)).or_else(|| {
            slot.flat_fallback
                .then(|| self.root.get(name))
                .flatten()
                .filter(|v| is_server_like(v))
        })
    }

    /// Names of server-shaped entries, sorted
    #[must_use]
    pub fn names(&self, slot: &McpSlot) -> Vec<String> {
        let mut names: Vec<String> = self
            .servers(slot)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default();
        if slot.flat_fallback && self.servers(slot).is_none() {
            if let Some(root) = self.root.as_object() {
                names.extend(
                    root.iter()
                        .filter(|(_, v)| is_server_like(v))
                        .map(|(k, _)| k.clone()),
                );
            }
        }
        names.sort();
        names
    }

    /// Insert or replace an entry, creating intermediate objects
    pub fn insert(&mut self, slot: &McpSlot, name: &str, value: Value) -> ConfigResult<()> {
        let mut current = &mut self.root;
        for key in &slot.keys {
            let object = current
                .as_object_mut()
                .ok_or_else(|| ConfigError::json(&slot.path, format!("'{key}' parent is not an object")))?;
            current = object
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        current
            .as_object_mut()
            .ok_or_else(|| ConfigError::json(&slot.path, "mcpServers is not an object"))?
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Remove an entry, returning it
    pub fn remove(&mut self, slot: &McpSlot, name: &str) -> Option<Value> {
        let pointer: String = slot.keys.iter().map(|k| format!("/{}", pointer_token(k))).collect();
        if let Some(removed) = self
            .root
            .pointer_mut(&pointer)
            .and_then(Value::as_object_mut)
            .and_then(|s| s.remove(name))
        {
            return Some(removed);
        }
        if slot.flat_fallback && self.root.get(name).is_some_and(is_server_like) {
            return self.root.as_object_mut().and_then(|r| r.remove(name));
        }
        None
    }

    /// Nothing left but (possibly empty) server containers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.as_object().map_or(true, |root| {
            root.iter().all(|(key, value)| {
                key == SERVERS_KEY && value.as_object().is_some_and(Map::is_empty)
            })
        })
    }

    /// Pretty JSON with a trailing newline
    pub fn render(&self) -> ConfigResult<String> {
        let mut text = serde_json::to_string_pretty(&self.root)
            .map_err(|e| ConfigError::ValidationError(format!("Failed to serialize config: {e}")))?;
        text.push('\n');
        Ok(text)
    }
}

fn is_server_like(value: &Value) -> bool {
    value.get("command").is_some() || value.get("url").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_slot() -> McpSlot {
        McpSlot::for_scope(
            ConfigScope::Project,
            &ClaudePaths::with_home("/home/dev"),
            Some(Path::new("/work/app")),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(McpServerConfig::stdio("npx", vec![]).validate().is_ok());
        assert!(McpServerConfig::http("https://x/mcp").validate().is_ok());
        let broken = McpServerConfig {
            command: None,
            ..McpServerConfig::stdio("x", vec![])
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_config_serializes_claude_shape() {
        let config = McpServerConfig::stdio("npx", vec!["-y".into(), "ctx".into()]).with_env("K", "v");
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({"type": "stdio", "command": "npx", "args": ["-y", "ctx"], "env": {"K": "v"}})
        );
        let parsed: McpServerConfig = serde_json::from_value(json!({"command": "pg"})).unwrap();
        assert_eq!(parsed.transport, McpTransport::Stdio);
    }

    #[test]
    fn test_update_apply() {
        let mut config = McpServerConfig::stdio("npx", vec!["a".into()]).with_env("OLD", "1");
        McpServerUpdate {
            add_args: Some(vec!["b".into()]),
            add_env: Some(BTreeMap::from([("NEW".to_string(), "2".to_string())])),
            remove_env: Some(vec!["OLD".into()]),
            ..McpServerUpdate::default()
        }
        .apply(&mut config);
        assert_eq!(config.args, vec!["a", "b"]);
        assert_eq!(config.env.keys().collect::<Vec<_>>(), vec!["NEW"]);
    }

    #[test]
    fn test_local_slot_nests_under_project_key() {
        let paths = ClaudePaths::with_home("/home/dev");
        let slot = McpSlot::for_scope(ConfigScope::Local, &paths, Some(Path::new("/work/app"))).unwrap();
        let mut doc = McpDocument::parse(&slot.path, Some(r#"{"theme":"dark"}"#)).unwrap();
        doc.insert(&slot, "db", json!({"command": "pg"})).unwrap();
        assert_eq!(doc.names(&slot), vec!["db"]);
        assert!(doc.render().unwrap().contains("/work/app"));
        assert!(!slot.removable_when_empty());

        assert!(doc.remove(&slot, "db").is_some());
        assert!(doc.remove(&slot, "db").is_none());
        assert!(doc.render().unwrap().contains("\"theme\": \"dark\""));
    }

    #[test]
    fn test_flat_project_file() {
        let slot = project_slot();
        let mut doc = McpDocument::parse(&slot.path, Some(r#"{"db":{"command":"pg"}}"#)).unwrap();
        assert_eq!(doc.names(&slot), vec!["db"]);
        assert!(doc.get(&slot, "db").is_some());
        assert!(doc.remove(&slot, "db").is_some());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_emptied_wrapped_file_is_empty() {
        let slot = project_slot();
        let mut doc =
            McpDocument::parse(&slot.path, Some(r#"{"mcpServers":{"db":{"command":"pg"}}}"#)).unwrap();
        doc.remove(&slot, "db");
        assert!(doc.is_empty());
        assert!(McpDocument::parse(&slot.path, Some("[1]")).is_err());
    }
}
