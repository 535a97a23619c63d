//! Settings and MCP configuration types

use crate::artifacts::HookInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Parsed settings.json content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsFile {
    pub path: PathBuf,
    pub sha256: String,
    /// Hooks declared under the `hooks` key
    #[serde(default)]
    pub hooks: Vec<HookInfo>,
    pub permissions: Option<Permissions>,
    /// `enabledPlugins` map (`name@marketplace` -> enabled)
    #[serde(default)]
    pub enabled_plugins: BTreeMap<String, bool>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub model: Option<String>,
}

/// Permissions configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    pub default_mode: Option<String>,
}

/// MCP server configuration read from one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default)]
    pub sha256: String,
    /// Servers sorted by name
    #[serde(default)]
    pub servers: Vec<McpServer>,
    /// Plugin that shipped this config, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_plugin: Option<String>,
}

/// One MCP server entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    pub name: String,
    pub transport: McpTransport,
    /// Executable for stdio servers
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Endpoint for http/sse servers
    pub url: Option<String>,
}

/// MCP transport types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    Stdio,
    Http,
    Sse,
}

impl McpTransport {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }
}

impl std::fmt::Display for McpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
