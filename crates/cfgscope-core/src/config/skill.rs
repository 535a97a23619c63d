//! Skill definitions for `skill create`

use serde::{Deserialize, Serialize};

/// Content of a new `SKILL.md`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkillConfig {
    pub description: String,

    /// Whether users can invoke the skill directly as `/name`
    #[serde(default, rename = "user-invocable")]
    pub user_invocable: bool,

    #[serde(
        default,
        rename = "allowed-tools",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_tools: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Instructions following the frontmatter
    pub body: String,
}

impl SkillConfig {
    pub fn new(description: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user_invocable(mut self, invocable: bool) -> Self {
        self.user_invocable = invocable;
        self
    }

    #[must_use]
    pub fn with_allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("description is required".into());
        }
        if self.body.trim().is_empty() {
            return Err("body/instructions is required".into());
        }
        Ok(())
    }

    /// Frontmatter lines; strings are JSON-quoted, which YAML accepts
    #[must_use]
    pub fn to_frontmatter(&self, name: &str) -> String {
        let quote = |s: &str| serde_json::Value::from(s).to_string();
        let mut lines = vec![
            format!("name: {}", quote(name)),
            format!("description: {}", quote(&self.description)),
        ];

        if self.user_invocable {
            lines.push("user-invocable: true".into());
        }
        if !self.allowed_tools.is_empty() {
            let tools: Vec<String> = self.allowed_tools.iter().map(|t| quote(t)).collect();
            lines.push(format!("allowed-tools: [{}]", tools.join(", ")));
        }
        if let Some(model) = &self.model {
            lines.push(format!("model: {}", quote(model)));
        }

        lines.join("\n")
    }

    #[must_use]
    pub fn to_skill_md(&self, name: &str) -> String {
        let body = self.body.trim_end();
        format!("---\n{}\n---\n\n{body}\n", self.to_frontmatter(name))
    }
}
