//! YAML frontmatter parser for skills, commands, and agents

use crate::artifacts::{AgentInfo, CommandInfo, HookDefinition, SkillInfo};
use crate::error::{ScanError, ScanResult};
use crate::hash::sha256_hex;
use crate::types::Scope;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Tool lists appear both as YAML sequences and as comma-separated strings
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ToolList {
    #[default]
    Empty,
    List(Vec<String>),
    Csv(String),
}

impl ToolList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Empty => Vec::new(),
            Self::List(items) => items,
            Self::Csv(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SkillFrontmatter {
    name: String,
    description: String,
    #[serde(default)]
    user_invocable: bool,
    #[serde(default)]
    disable_model_invocation: bool,
    #[serde(default)]
    allowed_tools: ToolList,
    model: Option<String>,
    #[serde(default)]
    hooks: HashMap<String, Vec<HookDefinition>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AgentFrontmatter {
    name: String,
    description: String,
    #[serde(default)]
    tools: ToolList,
    model: Option<String>,
    #[serde(default = "default_permission_mode", alias = "permissionMode")]
    permission_mode: String,
    #[serde(default)]
    skills: ToolList,
}

fn default_permission_mode() -> String {
    "default".to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CommandFrontmatter {
    description: Option<String>,
    #[serde(default)]
    allowed_tools: ToolList,
    #[serde(default)]
    thinking: bool,
}

/// Parse a SKILL.md file; `path` is the skill directory
pub fn parse_skill(path: &Path, content: &str, scope: Scope) -> ScanResult<SkillInfo> {
    let result = Matter::<YAML>::new().parse(content);

    let data = result
        .data
        .ok_or(ScanError::NoFrontmatter)?
        .deserialize::<SkillFrontmatter>()
        .map_err(|e| ScanError::FrontmatterParse(e.to_string()))?;

    if data.name.trim().is_empty() {
        return Err(ScanError::MissingField("name".into()));
    }

    Ok(SkillInfo {
        path: path.to_path_buf(),
        name: data.name,
        description: data.description,
        user_invocable: data.user_invocable,
        disable_model_invocation: data.disable_model_invocation,
        allowed_tools: data.allowed_tools.into_vec(),
        model: data.model,
        hooks: data.hooks,
        sha256: sha256_hex(content.as_bytes()),
        scope,
    })
}

/// Parse an agent definition file
pub fn parse_agent(path: &Path, content: &str, scope: Scope) -> ScanResult<AgentInfo> {
    let result = Matter::<YAML>::new().parse(content);

    let data = result
        .data
        .ok_or(ScanError::NoFrontmatter)?
        .deserialize::<AgentFrontmatter>()
        .map_err(|e| ScanError::FrontmatterParse(e.to_string()))?;

    Ok(AgentInfo {
        path: path.to_path_buf(),
        name: data.name,
        description: data.description,
        tools: data.tools.into_vec(),
        model: data.model,
        permission_mode: data.permission_mode,
        skills: data.skills.into_vec(),
        sha256: sha256_hex(content.as_bytes()),
        scope,
    })
}

/// Parse a command file
///
/// Frontmatter is optional for commands; the name comes from the file stem.
/// A frontmatter block that is present but malformed is still an error.
pub fn parse_command(path: &Path, content: &str, scope: Scope) -> ScanResult<CommandInfo> {
    let result = Matter::<YAML>::new().parse(content);

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ScanError::InvalidPath(path.display().to_string()))?
        .to_string();

    let fm = match result.data {
        Some(data) => data
            .deserialize::<CommandFrontmatter>()
            .map_err(|e| ScanError::FrontmatterParse(e.to_string()))?,
        None => CommandFrontmatter::default(),
    };

    Ok(CommandInfo {
        path: path.to_path_buf(),
        name,
        description: fm.description,
        allowed_tools: fm.allowed_tools.into_vec(),
        thinking: fm.thinking,
        body: result.content,
        sha256: sha256_hex(content.as_bytes()),
        scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_skill() {
        let content = r"---
name: test-skill
description: A test skill
user-invocable: true
allowed-tools:
  - Read
  - Grep
---

# Test Skill Instructions
";
        let skill = parse_skill(&PathBuf::from("test"), content, Scope::User).unwrap();
        assert_eq!(skill.name, "test-skill");
        assert_eq!(skill.description, "A test skill");
        assert!(skill.user_invocable);
        assert_eq!(skill.allowed_tools, vec!["Read", "Grep"]);
    }

    #[test]
    fn test_parse_agent_with_csv_tools() {
        let content = r"---
name: reviewer
description: Reviews code
tools: Read, Grep, Glob
---
Review carefully.
";
        let agent = parse_agent(&PathBuf::from("reviewer.md"), content, Scope::Project).unwrap();
        assert_eq!(agent.tools, vec!["Read", "Grep", "Glob"]);
        assert_eq!(agent.permission_mode, "default");
    }

    #[test]
    fn test_parse_command() {
        let content = r"---
description: A test command
thinking: true
---

Do something with $ARGUMENTS
";
        let cmd = parse_command(&PathBuf::from("test-cmd.md"), content, Scope::Project).unwrap();
        assert_eq!(cmd.name, "test-cmd");
        assert_eq!(cmd.description, Some("A test command".to_string()));
        assert!(cmd.thinking);
    }

    #[test]
    fn test_parse_command_without_frontmatter() {
        let cmd = parse_command(&PathBuf::from("plain.md"), "Just a body\n", Scope::User).unwrap();
        assert_eq!(cmd.name, "plain");
        assert!(cmd.description.is_none());
    }

    #[test]
    fn test_skill_without_frontmatter_is_error() {
        let err = parse_skill(&PathBuf::from("x"), "# nothing here", Scope::User).unwrap_err();
        assert!(err.is_parse());
    }
}
