//! Uniform tool records
//!
//! Every definition the scanner finds, whatever file format it came from,
//! can be viewed as a [`ToolRecord`]. Records are snapshots of disk state at
//! scan time and are rebuilt on every scan.

use crate::artifacts::{AgentInfo, CommandInfo, HookDefinition, HookInfo, HookTrigger, SkillInfo};
use crate::settings::{McpServer, McpTransport};
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of tool definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Skill,
    Command,
    Agent,
    Mcp,
    Hook,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        Self::Skill,
        Self::Command,
        Self::Agent,
        Self::Mcp,
        Self::Hook,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Command => "command",
            Self::Agent => "agent",
            Self::Mcp => "mcp",
            Self::Hook => "hook",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skill" | "skills" => Ok(Self::Skill),
            "command" | "commands" => Ok(Self::Command),
            "agent" | "agents" => Ok(Self::Agent),
            "mcp" | "mcp-server" | "mcp_server" => Ok(Self::Mcp),
            "hook" | "hooks" => Ok(Self::Hook),
            _ => Err(format!("Unknown tool kind: {s}")),
        }
    }
}

/// Kind-specific details of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ToolMetadata {
    Skill {
        user_invocable: bool,
        allowed_tools: Vec<String>,
    },
    Command {
        allowed_tools: Vec<String>,
    },
    Agent {
        tools: Vec<String>,
    },
    Mcp {
        transport: McpTransport,
        command: Option<String>,
        args: Vec<String>,
        env: BTreeMap<String, String>,
        url: Option<String>,
    },
    Hook {
        trigger: HookTrigger,
        matcher: Option<String>,
        definition: HookDefinition,
    },
}

/// One discovered definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    pub kind: ToolKind,
    pub scope: Scope,
    /// Skill directory, markdown file, or the JSON file holding the entry
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub metadata: ToolMetadata,
}

impl ToolRecord {
    /// Case-insensitive name comparison
    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    #[must_use]
    pub fn from_skill(skill: &SkillInfo) -> Self {
        Self {
            name: skill.name.clone(),
            kind: ToolKind::Skill,
            scope: skill.scope.clone(),
            path: skill.path.clone(),
            description: Some(skill.description.clone()),
            metadata: ToolMetadata::Skill {
                user_invocable: skill.user_invocable,
                allowed_tools: skill.allowed_tools.clone(),
            },
        }
    }

    #[must_use]
    pub fn from_command(command: &CommandInfo) -> Self {
        Self {
            name: command.name.clone(),
            kind: ToolKind::Command,
            scope: command.scope.clone(),
            path: command.path.clone(),
            description: command.description.clone(),
            metadata: ToolMetadata::Command {
                allowed_tools: command.allowed_tools.clone(),
            },
        }
    }

    #[must_use]
    pub fn from_agent(agent: &AgentInfo) -> Self {
        Self {
            name: agent.name.clone(),
            kind: ToolKind::Agent,
            scope: agent.scope.clone(),
            path: agent.path.clone(),
            description: Some(agent.description.clone()),
            metadata: ToolMetadata::Agent {
                tools: agent.tools.clone(),
            },
        }
    }

    #[must_use]
    pub fn from_mcp(server: &McpServer, scope: Scope, path: &Path) -> Self {
        Self {
            name: server.name.clone(),
            kind: ToolKind::Mcp,
            scope,
            path: path.to_path_buf(),
            description: None,
            metadata: ToolMetadata::Mcp {
                transport: server.transport,
                command: server.command.clone(),
                args: server.args.clone(),
                env: server.env.clone(),
                url: server.url.clone(),
            },
        }
    }

    #[must_use]
    pub fn from_hook(hook: &HookInfo) -> Self {
        Self {
            name: hook.name(),
            kind: ToolKind::Hook,
            scope: hook.scope.clone(),
            path: hook.path(),
            description: None,
            metadata: ToolMetadata::Hook {
                trigger: hook.trigger,
                matcher: hook.matcher.clone(),
                definition: hook.definition.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_aliases() {
        assert_eq!("skills".parse::<ToolKind>().unwrap(), ToolKind::Skill);
        assert_eq!("MCP".parse::<ToolKind>().unwrap(), ToolKind::Mcp);
        assert!("plugin".parse::<ToolKind>().is_err());
    }

    #[test]
    fn test_mcp_record() {
        let server = McpServer {
            name: "github".into(),
            transport: McpTransport::Http,
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            url: Some("https://api.example.com/mcp".into()),
        };
        let record = ToolRecord::from_mcp(&server, Scope::User, Path::new("/h/.claude.json"));
        assert_eq!(record.kind, ToolKind::Mcp);
        assert!(record.name_matches("GitHub"));
        assert!(matches!(
            record.metadata,
            ToolMetadata::Mcp { transport: McpTransport::Http, .. }
        ));
    }
}
