//! Inventory types for scan results

use crate::artifacts::{AgentInfo, CommandInfo, HookInfo, SkillInfo};
use crate::collision::CollisionReport;
use crate::error::ScanWarning;
use crate::paths::ClaudePaths;
use crate::plugins::PluginInventory;
use crate::record::{ToolKind, ToolRecord};
use crate::settings::{McpConfig, SettingsFile};
use crate::types::{FileInfo, HostInfo, Scope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete inventory from one scan
///
/// A read-only snapshot: built fresh per scan request and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub host: HostInfo,
    pub user_scope: UserScope,
    /// Managed scope inventory, when managed scanning is enabled and present
    pub managed_scope: Option<ManagedScope>,
    /// Projects sorted by path
    pub projects: Vec<ProjectScope>,
    pub plugins: PluginInventory,
    pub collisions: CollisionReport,
    /// Projects whose scan failed; the rest of the inventory is still valid
    #[serde(default)]
    pub failures: Vec<ProjectScanFailure>,
    /// Files skipped during the scan
    #[serde(default)]
    pub warnings: Vec<ScanWarning>,
    pub scanned_at: DateTime<Utc>,
}

impl Inventory {
    /// Every record in the inventory, across all scopes
    #[must_use]
    pub fn records(&self) -> Vec<ToolRecord> {
        let mut records = self.user_scope.contents.records(&Scope::User);
        if let Some(managed) = &self.managed_scope {
            records.extend(managed.contents.records(&Scope::Managed));
        }
        for project in &self.projects {
            records.extend(project.records());
        }
        for plugin in &self.plugins.installed {
            records.extend(plugin.contents.records(&plugin.scope()));
        }
        records
    }

    /// Records visible from one project: global scopes plus that project's own
    #[must_use]
    pub fn records_for_project(&self, project: Option<&Path>) -> Vec<ToolRecord> {
        let project = project.map(ClaudePaths::canonical_project);
        let project = project.as_deref();
        let mut records = self.user_scope.contents.records(&Scope::User);
        if let Some(managed) = &self.managed_scope {
            records.extend(managed.contents.records(&Scope::Managed));
        }
        if let Some(path) = project {
            if let Some(scope) = self.project(path) {
                records.extend(scope.records());
            }
        }
        for plugin in &self.plugins.installed {
            if plugin.enabled && plugin.visible_from(project) {
                records.extend(plugin.contents.records(&plugin.scope()));
            }
        }
        records
    }

    /// Find a scanned project by path, however it was spelled
    #[must_use]
    pub fn project(&self, path: &Path) -> Option<&ProjectScope> {
        let canonical = ClaudePaths::canonical_project(path);
        self.projects
            .iter()
            .find(|p| p.path == path || p.path == canonical)
    }

    /// Total number of records of one kind
    #[must_use]
    pub fn count(&self, kind: ToolKind) -> usize {
        self.records().iter().filter(|r| r.kind == kind).count()
    }
}

/// Everything one scope root contributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeContents {
    pub settings: Option<SettingsFile>,
    pub mcp: Option<McpConfig>,
    #[serde(default)]
    pub skills: Vec<SkillInfo>,
    #[serde(default)]
    pub commands: Vec<CommandInfo>,
    #[serde(default)]
    pub agents: Vec<AgentInfo>,
    /// Hooks from settings and hook files
    #[serde(default)]
    pub hooks: Vec<HookInfo>,
}

impl ScopeContents {
    /// Flatten into tool records; MCP servers are tagged with `scope`
    #[must_use]
    pub fn records(&self, scope: &Scope) -> Vec<ToolRecord> {
        let mut records = Vec::new();
        records.extend(self.skills.iter().map(ToolRecord::from_skill));
        records.extend(self.commands.iter().map(ToolRecord::from_command));
        records.extend(self.agents.iter().map(ToolRecord::from_agent));
        if let Some(mcp) = &self.mcp {
            records.extend(
                mcp.servers
                    .iter()
                    .map(|s| ToolRecord::from_mcp(s, scope.clone(), &mcp.path)),
            );
        }
        records.extend(self.hooks.iter().map(ToolRecord::from_hook));
        records
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_none()
            && self.mcp.as_ref().map_or(true, |m| m.servers.is_empty())
            && self.skills.is_empty()
            && self.commands.is_empty()
            && self.agents.is_empty()
            && self.hooks.is_empty()
    }
}

/// User-level scope inventory (`~/.claude`, `~/.claude.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserScope {
    #[serde(flatten)]
    pub contents: ScopeContents,
}

/// Organization-managed scope inventory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagedScope {
    #[serde(flatten)]
    pub contents: ScopeContents,
}

/// Project-level scope inventory, including its local overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectScope {
    pub path: PathBuf,
    pub name: String,
    pub git: Option<GitInfo>,
    pub claude_md: Option<FileInfo>,
    /// `.claude` directory, when present
    pub claude_dir: Option<PathBuf>,
    /// Shared project configuration
    pub project: ScopeContents,
    /// Developer-only overrides (settings.local.json, local MCP servers)
    pub local: ScopeContents,
}

impl ProjectScope {
    /// Project and local records for this project
    #[must_use]
    pub fn records(&self) -> Vec<ToolRecord> {
        let mut records = self.project.records(&Scope::Project);
        records.extend(self.local.records(&Scope::Local));
        records
    }
}

/// Git repository information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitInfo {
    pub remote: Option<String>,
    pub branch: String,
    /// Whether there are uncommitted changes
    pub is_dirty: bool,
}

/// A project that could not be scanned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectScanFailure {
    pub path: PathBuf,
    pub error: String,
}
