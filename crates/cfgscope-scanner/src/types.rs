//! Shared scanner types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a definition physically lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "plugin_id")]
pub enum Scope {
    /// User-level (~/.claude/)
    User,
    /// Project-level (.claude/, .mcp.json)
    Project,
    /// Developer-only project overrides (settings.local.json, ~/.claude.json project entry)
    Local,
    /// Organization-managed (/etc/claude and platform equivalents)
    Managed,
    /// Provided by an installed plugin, keyed by `name@marketplace`
    Plugin(String),
}

impl Scope {
    /// Precedence rank, higher wins: Managed > Local > Project > User > Plugin
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Managed => 4,
            Self::Local => 3,
            Self::Project => 2,
            Self::User => 1,
            Self::Plugin(_) => 0,
        }
    }

    /// Short lowercase label without the plugin id
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Local => "local",
            Self::Managed => "managed",
            Self::Plugin(_) => "plugin",
        }
    }

    #[must_use]
    pub fn is_plugin(&self) -> bool {
        matches!(self, Self::Plugin(_))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin(id) => write!(f, "plugin:{id}"),
            other => f.write_str(other.label()),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("plugin:") {
            if id.is_empty() {
                return Err(format!("Invalid scope: {s}"));
            }
            return Ok(Scope::Plugin(id.to_string()));
        }
        match s.to_lowercase().as_str() {
            "user" | "global" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            "local" => Ok(Scope::Local),
            "managed" => Ok(Scope::Managed),
            _ => Err(format!("Invalid scope: {s}")),
        }
    }
}

/// Information about a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path to the file
    pub path: PathBuf,
    /// SHA256 hash of the file contents
    pub sha256: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Host system information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    /// Operating system
    pub os: String,
    /// Current username
    pub username: String,
    /// Home directory that was scanned
    pub home_dir: PathBuf,
}

impl HostInfo {
    /// Describe the current system, reporting `home` as the scanned home
    #[must_use]
    pub fn current(home: PathBuf) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            username: whoami_username(),
            home_dir: home,
        }
    }
}

fn whoami_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
