//! Configuration scope handling
//!
//! The writable subset of scanner scopes, and where each keeps its files.

use super::error::{ConfigError, ConfigResult};
use cfgscope_scanner::{ClaudePaths, Scope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration scope - where a config item lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    /// `~/.claude/`, `~/.claude.json`
    User,
    /// `.claude/`, `.mcp.json` in the project root
    Project,
    /// Developer-only overrides, gitignored or kept in `~/.claude.json`
    Local,
    /// Read-only, system-level
    Managed,
}

impl ConfigScope {
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Managed)
    }

    #[must_use]
    pub fn writable_scopes() -> &'static [ConfigScope] {
        &[Self::User, Self::Project, Self::Local]
    }

    /// The scanner scope this corresponds to
    #[must_use]
    pub fn to_scope(self) -> Scope {
        match self {
            Self::User => Scope::User,
            Self::Project => Scope::Project,
            Self::Local => Scope::Local,
            Self::Managed => Scope::Managed,
        }
    }

    pub(crate) fn require_writable(self) -> ConfigResult<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(ConfigError::ManagedScope)
        }
    }

    /// The `.claude` directory holding skills, commands and agents
    ///
    /// Local scope has no directory of its own; tool files are shared with
    /// the project.
    pub fn claude_dir(self, paths: &ClaudePaths, project: Option<&Path>) -> ConfigResult<PathBuf> {
        match self {
            Self::User => Ok(paths.user_claude_dir()),
            Self::Project => Ok(ClaudePaths::project_claude_dir(require_project(project)?)),
            Self::Local => Err(ConfigError::InvalidScope(
                "local scope has no tool directory; use project".into(),
            )),
            Self::Managed => Err(ConfigError::ManagedScope),
        }
    }
}

pub(crate) fn require_project(project: Option<&Path>) -> ConfigResult<&Path> {
    project.ok_or_else(|| {
        ConfigError::ValidationError("Project path required for project/local scope".into())
    })
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Project => write!(f, "project"),
            Self::Local => write!(f, "local"),
            Self::Managed => write!(f, "managed"),
        }
    }
}

impl FromStr for ConfigScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "global" => Ok(Self::User),
            "project" => Ok(Self::Project),
            "local" => Ok(Self::Local),
            "managed" => Ok(Self::Managed),
            _ => Err(ConfigError::InvalidScope(s.to_string())),
        }
    }
}
