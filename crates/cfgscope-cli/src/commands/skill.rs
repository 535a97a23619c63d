//! Skill CLI commands
//!
//! Handles: cfgscope skill create/add/remove

use super::print_result;
use crate::Context;
use anyhow::Result;
use cfgscope_scanner::ToolKind;
use cfgscope_core::config::{ConfigScope, LocalToolOps, SkillConfig};
use clap::Subcommand;
use std::path::PathBuf;

/// Skill commands
#[derive(Subcommand)]
pub enum SkillCommands {
    /// Write a new skill
    Create {
        /// Skill name
        name: String,
        /// Target scope
        #[arg(long, default_value = "project")]
        scope: String,
        /// Skill description
        #[arg(long)]
        description: String,
        /// Skill body/instructions
        #[arg(long)]
        body: String,
        /// Allow direct user invocation (/skill-name)
        #[arg(long)]
        user_invocable: bool,
        /// Allowed tools (can specify multiple times)
        #[arg(long = "allowed-tools")]
        allowed_tools: Vec<String>,
        /// Preferred model
        #[arg(long)]
        model: Option<String>,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy an existing skill directory into a scope
    Add {
        /// Skill name
        name: String,
        /// Skill directory or its SKILL.md
        source: PathBuf,
        /// Target scope
        #[arg(long, default_value = "project")]
        scope: String,
        /// Replace an existing skill
        #[arg(long)]
        force: bool,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove a skill
    Remove {
        /// Skill name
        name: String,
        /// Scope to remove from
        #[arg(long, default_value = "project")]
        scope: String,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn execute(ctx: &Context, cmd: SkillCommands, project: PathBuf) -> Result<()> {
    let ops = LocalToolOps::new(ctx.claude().clone(), Some(project));

    match cmd {
        SkillCommands::Create {
            name,
            scope,
            description,
            body,
            user_invocable,
            allowed_tools,
            model,
            dry_run,
            json,
        } => {
            let scope: ConfigScope = scope.parse()?;
            let mut config = SkillConfig::new(description, body)
                .with_user_invocable(user_invocable)
                .with_allowed_tools(allowed_tools);
            if let Some(model) = model {
                config = config.with_model(model);
            }
            let result = ops.create_skill(&name, &config, scope, dry_run)?;
            print_result(&result, dry_run, json)
        }
        SkillCommands::Add {
            name,
            source,
            scope,
            force,
            dry_run,
        } => {
            let result = ops.add(ToolKind::Skill, &name, &source, scope.parse()?, force, dry_run)?;
            print_result(&result, dry_run, false)
        }
        SkillCommands::Remove { name, scope, dry_run } => {
            let result = ops.remove(ToolKind::Skill, &name, scope.parse()?, dry_run)?;
            print_result(&result, dry_run, false)
        }
    }
}
