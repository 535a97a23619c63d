//! Artifact types: skills, commands, agents, hooks

use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Skill parsed from `skills/<name>/SKILL.md`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Path to the skill directory
    pub path: PathBuf,
    pub name: String,
    pub description: String,
    /// Whether the skill can be invoked by users
    #[serde(default)]
    pub user_invocable: bool,
    #[serde(default)]
    pub disable_model_invocation: bool,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    pub model: Option<String>,
    /// Embedded hooks, keyed by trigger event
    #[serde(default)]
    pub hooks: HashMap<String, Vec<HookDefinition>>,
    /// SHA256 of SKILL.md
    pub sha256: String,
    pub scope: Scope,
}

/// Slash command parsed from `commands/**/*.md`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Path to the command file
    pub path: PathBuf,
    /// Command name, namespaced by subdirectory (`git:commit`)
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub thinking: bool,
    /// Template body
    pub body: String,
    pub sha256: String,
    pub scope: Scope,
}

/// Subagent parsed from `agents/*.md`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub path: PathBuf,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
    pub model: Option<String>,
    #[serde(default = "default_permission_mode")]
    pub permission_mode: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub sha256: String,
    pub scope: Scope,
}

fn default_permission_mode() -> String {
    "default".to_string()
}

/// A single hook handler bound to a trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookInfo {
    /// Where the hook is defined
    pub source: HookSource,
    pub trigger: HookTrigger,
    /// Tool matcher pattern (`Bash`, `Edit|Write`)
    pub matcher: Option<String>,
    pub definition: HookDefinition,
    pub scope: Scope,
}

impl HookInfo {
    /// Stable display name: `<Trigger>` or `<Trigger>:<matcher>`
    #[must_use]
    pub fn name(&self) -> String {
        match &self.matcher {
            Some(m) if !m.is_empty() => format!("{}:{m}", self.trigger),
            _ => self.trigger.to_string(),
        }
    }

    /// File the hook was read from
    #[must_use]
    pub fn path(&self) -> PathBuf {
        match &self.source {
            HookSource::Settings { path }
            | HookSource::Skill { path, .. }
            | HookSource::Plugin { path, .. } => path.clone(),
        }
    }
}

/// Source of a hook definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HookSource {
    /// From a settings file
    Settings { path: PathBuf },
    /// Embedded in a skill's frontmatter
    Skill { name: String, path: PathBuf },
    /// From a plugin's hooks/hooks.json
    Plugin { plugin_id: String, path: PathBuf },
}

/// Hook trigger events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookTrigger {
    PreToolUse,
    PostToolUse,
    PermissionRequest,
    UserPromptSubmit,
    SessionStart,
    SessionEnd,
    Notification,
    Stop,
    SubagentStop,
    PreCompact,
}

impl HookTrigger {
    pub const ALL: [HookTrigger; 10] = [
        Self::PreToolUse,
        Self::PostToolUse,
        Self::PermissionRequest,
        Self::UserPromptSubmit,
        Self::SessionStart,
        Self::SessionEnd,
        Self::Notification,
        Self::Stop,
        Self::SubagentStop,
        Self::PreCompact,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::PermissionRequest => "PermissionRequest",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::Notification => "Notification",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
            Self::PreCompact => "PreCompact",
        }
    }
}

impl fmt::Display for HookTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown hook trigger: {s}"))
    }
}

/// Hook action definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HookDefinition {
    /// Run a shell command
    #[serde(rename = "command")]
    Command {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<u64>,
    },
    /// Ask the model with a prompt
    #[serde(rename = "prompt")]
    Prompt { prompt: String },
    /// Invoke an agent
    #[serde(rename = "agent")]
    Agent { agent: String },
}
