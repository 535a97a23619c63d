//! Profile types

use cfgscope_scanner::record::ToolKind;
use cfgscope_scanner::types::Scope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Source tracking mode for profile tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Frozen at the copied version
    Pin,
    /// Follow the source and report drift
    #[default]
    Track,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pin" | "pinned" => Ok(Self::Pin),
            "track" | "tracked" => Ok(Self::Track),
            _ => Err(format!("Unknown source mode: {s}")),
        }
    }
}

/// Where a captured tool came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// File or directory holding the original
    pub source_path: PathBuf,
    /// JSON pointer to the entry inside `source_path`, for MCP servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Hook group inside `source_path`, found by content on every read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<HookSelector>,
    /// SHA256 of the content at copy time
    pub source_hash: String,
    pub mode: SourceMode,
    /// RFC 3339 timestamp of the last copy
    pub copied_at: String,
}

/// A hook group identified by trigger and matcher rather than position
///
/// Groups sharing a matcher are told apart by `handler`, the SHA256 of the
/// captured handler definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSelector {
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

/// Type of tool a profile can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Mcp,
    Skill,
    Command,
    Agent,
    Hook,
}

impl ToolType {
    #[must_use]
    pub fn kind(self) -> ToolKind {
        match self {
            Self::Mcp => ToolKind::Mcp,
            Self::Skill => ToolKind::Skill,
            Self::Command => ToolKind::Command,
            Self::Agent => ToolKind::Agent,
            Self::Hook => ToolKind::Hook,
        }
    }
}

impl From<ToolKind> for ToolType {
    fn from(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Mcp => Self::Mcp,
            ToolKind::Skill => Self::Skill,
            ToolKind::Command => Self::Command,
            ToolKind::Agent => Self::Agent,
            ToolKind::Hook => Self::Hook,
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

impl FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ToolKind>().map(Self::from)
    }
}

/// Permission restrictions for a tool in a profile
///
/// An all-empty value means "no restrictions" and is never stored; the
/// editing helpers on [`PermissionsExt`] collapse it to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPermissions {
    /// Relative paths are resolved against the project root
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed_directories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed_tools: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub disallowed_tools: BTreeSet<String>,
}

impl ToolPermissions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_directories.is_empty()
            && self.allowed_tools.is_empty()
            && self.disallowed_tools.is_empty()
    }

    /// `None` when there is nothing to restrict
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

/// Edits on optional permissions that keep the empty value normalized
pub trait PermissionsExt {
    fn allow_directory(&mut self, dir: &str);
    fn remove_directory(&mut self, dir: &str);
    fn allow_tool(&mut self, tool: &str);
    fn remove_tool(&mut self, tool: &str);
    fn disallow_tool(&mut self, tool: &str);
    fn remove_disallowed(&mut self, tool: &str);
}

fn edit_permissions(
    slot: &mut Option<ToolPermissions>,
    edit: impl FnOnce(&mut ToolPermissions),
) {
    let mut permissions = slot.take().unwrap_or_default();
    edit(&mut permissions);
    *slot = permissions.normalized();
}

impl PermissionsExt for Option<ToolPermissions> {
    fn allow_directory(&mut self, dir: &str) {
        edit_permissions(self, |p| {
            p.allowed_directories.insert(dir.to_string());
        });
    }

    fn remove_directory(&mut self, dir: &str) {
        edit_permissions(self, |p| {
            p.allowed_directories.remove(dir);
        });
    }

    fn allow_tool(&mut self, tool: &str) {
        edit_permissions(self, |p| {
            p.allowed_tools.insert(tool.to_string());
        });
    }

    fn remove_tool(&mut self, tool: &str) {
        edit_permissions(self, |p| {
            p.allowed_tools.remove(tool);
        });
    }

    fn disallow_tool(&mut self, tool: &str) {
        edit_permissions(self, |p| {
            p.disallowed_tools.insert(tool.to_string());
        });
    }

    fn remove_disallowed(&mut self, tool: &str) {
        edit_permissions(self, |p| {
            p.disallowed_tools.remove(tool);
        });
    }
}

/// Stored `{}` reads back as no restrictions
fn deserialize_permissions<'de, D>(deserializer: D) -> Result<Option<ToolPermissions>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<ToolPermissions>::deserialize(deserializer)?;
    Ok(value.and_then(ToolPermissions::normalized))
}

/// A profile's reference to one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRef {
    pub name: String,
    pub tool_type: ToolType,
    /// Scope the tool was found in
    #[serde(default)]
    pub source_scope: Option<Scope>,
    #[serde(default, deserialize_with = "deserialize_permissions")]
    pub permissions: Option<ToolPermissions>,
    /// Set for tools whose content was captured into the profile
    #[serde(default)]
    pub source_ref: Option<SourceRef>,
}

impl ToolRef {
    #[must_use]
    pub fn new(name: impl Into<String>, tool_type: ToolType) -> Self {
        Self {
            name: name.into(),
            tool_type,
            source_scope: None,
            permissions: None,
            source_ref: None,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.source_scope = Some(scope);
        self
    }

    /// Same name (case-insensitive) and type
    #[must_use]
    pub fn same_tool(&self, other: &ToolRef) -> bool {
        self.tool_type == other.tool_type && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// A plugin a profile asks to have installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePluginRef {
    pub id: String,
    pub marketplace: Option<String>,
    pub scope: Scope,
    pub enabled: bool,
}

impl ProfilePluginRef {
    /// `name@marketplace`, or the bare id
    #[must_use]
    pub fn key(&self) -> String {
        match &self.marketplace {
            Some(marketplace) => format!("{}@{marketplace}", self.id),
            None => self.id.clone(),
        }
    }
}

/// A project a profile is assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub path: PathBuf,
    pub name: String,
}

impl ProjectInfo {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            path: path.to_path_buf(),
            name,
        }
    }
}

/// A named, portable bundle of tool references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tool_refs: Vec<ToolRef>,
    #[serde(default)]
    pub plugin_refs: Vec<ProfilePluginRef>,
    /// Whether a CLAUDE.md is stored with the profile
    #[serde(default)]
    pub has_claude_md: bool,
    #[serde(default)]
    pub assigned_projects: Vec<ProjectInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    #[must_use]
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            tool_refs: Vec::new(),
            plugin_refs: Vec::new(),
            has_claude_md: false,
            assigned_projects: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Index of the first tool named `name`, case-insensitive
    #[must_use]
    pub fn tool_index(&self, name: &str) -> Option<usize> {
        self.tool_refs
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn has_tool(&self, tool: &ToolRef) -> bool {
        self.tool_refs.iter().any(|t| t.same_tool(tool))
    }
}
