//! Command and agent CLI commands
//!
//! Handles: cfgscope tool add/remove

use super::print_result;
use crate::Context;
use anyhow::Result;
use cfgscope_scanner::ToolKind;
use cfgscope_core::config::LocalToolOps;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

/// File-based tool kinds managed here; skills have their own command
#[derive(Clone, Copy, ValueEnum)]
pub enum FileToolKind {
    Command,
    Agent,
}

impl From<FileToolKind> for ToolKind {
    fn from(kind: FileToolKind) -> Self {
        match kind {
            FileToolKind::Command => ToolKind::Command,
            FileToolKind::Agent => ToolKind::Agent,
        }
    }
}

#[derive(Subcommand)]
pub enum ToolCommands {
    /// Copy a command or agent file into a scope
    Add {
        #[arg(value_enum)]
        kind: FileToolKind,
        /// Tool name (commands may use `ns:name`)
        name: String,
        /// Markdown file to copy
        source: PathBuf,
        /// Target scope
        #[arg(long, default_value = "project")]
        scope: String,
        /// Replace an existing tool
        #[arg(long)]
        force: bool,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove a command or agent
    Remove {
        #[arg(value_enum)]
        kind: FileToolKind,
        name: String,
        /// Scope to remove from
        #[arg(long, default_value = "project")]
        scope: String,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn execute(ctx: &Context, cmd: ToolCommands, project: PathBuf) -> Result<()> {
    let ops = LocalToolOps::new(ctx.claude().clone(), Some(project));

    let (result, dry_run) = match cmd {
        ToolCommands::Add {
            kind,
            name,
            source,
            scope,
            force,
            dry_run,
        } => (
            ops.add(kind.into(), &name, &source, scope.parse()?, force, dry_run)?,
            dry_run,
        ),
        ToolCommands::Remove {
            kind,
            name,
            scope,
            dry_run,
        } => (ops.remove(kind.into(), &name, scope.parse()?, dry_run)?, dry_run),
    };
    print_result(&result, dry_run, false)
}
