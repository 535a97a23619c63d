//! File-based tools in a scope's `.claude` directory
//!
//! Skills are directories (`skills/<name>/SKILL.md`), commands and agents
//! single markdown files. Adds and removes are planned through the apply
//! engine like every other config change.

use super::error::{ConfigError, ConfigResult};
use super::ops::{OperationResult, OperationType, PlannedOperation};
use super::scope::ConfigScope;
use super::skill::SkillConfig;
use crate::apply::{ChangeSet, PendingChange};
use crate::util::{command_rel_path, validate_command_name, validate_name};
use cfgscope_scanner::{ClaudePaths, ToolKind};
use std::fs;
use std::path::{Path, PathBuf};

const SKILL_FILE: &str = "SKILL.md";

/// Add, remove and create skills, commands and agents
pub struct LocalToolOps {
    paths: ClaudePaths,
    project: Option<PathBuf>,
}

impl LocalToolOps {
    #[must_use]
    pub fn new(paths: ClaudePaths, project: Option<PathBuf>) -> Self {
        let project = project.as_deref().map(ClaudePaths::canonical_project);
        Self { paths, project }
    }

    /// Skill directory, or command/agent file, for `name` in `scope`
    pub fn tool_path(&self, kind: ToolKind, name: &str, scope: ConfigScope) -> ConfigResult<PathBuf> {
        let invalid = |e: crate::util::PathError| ConfigError::ValidationError(e.to_string());
        let dir = scope.claude_dir(&self.paths, self.project.as_deref())?;
        match kind {
            ToolKind::Skill => {
                validate_name(name).map_err(invalid)?;
                Ok(dir.join("skills").join(name))
            }
            ToolKind::Command => {
                validate_command_name(name).map_err(invalid)?;
                Ok(dir.join("commands").join(command_rel_path(name)))
            }
            ToolKind::Agent => {
                validate_name(name).map_err(invalid)?;
                Ok(dir.join("agents").join(format!("{name}.md")))
            }
            ToolKind::Mcp | ToolKind::Hook => Err(ConfigError::ValidationError(format!(
                "{kind} definitions live in JSON settings, not tool files"
            ))),
        }
    }

    /// Copy a tool from `source` into `scope`
    ///
    /// A skill source is its directory (or its `SKILL.md`); commands and
    /// agents are single files. `force` replaces an existing tool.
    pub fn plan_add(
        &self,
        kind: ToolKind,
        name: &str,
        source: &Path,
        scope: ConfigScope,
        force: bool,
    ) -> ConfigResult<PlannedOperation> {
        scope.require_writable()?;
        let target = self.tool_path(kind, name, scope)?;
        if target.exists() && !force {
            return Err(ConfigError::ItemExists {
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }

        let mut set = ChangeSet::new(format!("Add {kind} '{name}' to {scope} scope"));
        if kind == ToolKind::Skill {
            let src_dir = if source.is_file() {
                source.parent().unwrap_or(source)
            } else {
                source
            };
            if !src_dir.join(SKILL_FILE).is_file() {
                return Err(ConfigError::ValidationError(format!(
                    "{} has no {SKILL_FILE}",
                    src_dir.display()
                )));
            }
            set.write_tree(src_dir, &target)?;
        } else {
            let content = fs::read_to_string(source).map_err(|e| ConfigError::io(source, e))?;
            set.write(&target, content)?;
        }

        Ok(planned(set, OperationType::Add, name, scope))
    }

    pub fn add(
        &self,
        kind: ToolKind,
        name: &str,
        source: &Path,
        scope: ConfigScope,
        force: bool,
        dry_run: bool,
    ) -> ConfigResult<OperationResult> {
        self.plan_add(kind, name, source, scope, force)?.run(dry_run)
    }

    pub fn plan_remove(&self, kind: ToolKind, name: &str, scope: ConfigScope) -> ConfigResult<PlannedOperation> {
        scope.require_writable()?;
        let target = self.tool_path(kind, name, scope)?;
        if !target.exists() {
            return Err(ConfigError::ItemNotFound {
                name: name.to_string(),
            });
        }

        let mut set = ChangeSet::new(format!("Remove {kind} '{name}' from {scope} scope"));
        if kind == ToolKind::Skill {
            set.delete_tree(&target)?;
        } else {
            set.delete(&target)?;
        }
        Ok(planned(set, OperationType::Remove, name, scope))
    }

    pub fn remove(&self, kind: ToolKind, name: &str, scope: ConfigScope, dry_run: bool) -> ConfigResult<OperationResult> {
        self.plan_remove(kind, name, scope)?.run(dry_run)
    }

    /// Write a new `SKILL.md` for `name`
    pub fn plan_create_skill(&self, name: &str, config: &SkillConfig, scope: ConfigScope) -> ConfigResult<PlannedOperation> {
        scope.require_writable()?;
        config.validate().map_err(ConfigError::ValidationError)?;
        let dir = self.tool_path(ToolKind::Skill, name, scope)?;
        if dir.exists() {
            return Err(ConfigError::ItemExists {
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }

        let mut set = ChangeSet::new(format!("Create skill '{name}' in {scope} scope"));
        set.write(dir.join(SKILL_FILE), config.to_skill_md(name))?;
        Ok(planned(set, OperationType::Create, name, scope))
    }

    pub fn create_skill(
        &self,
        name: &str,
        config: &SkillConfig,
        scope: ConfigScope,
        dry_run: bool,
    ) -> ConfigResult<OperationResult> {
        self.plan_create_skill(name, config, scope)?.run(dry_run)
    }
}

fn planned(set: ChangeSet, operation: OperationType, name: &str, scope: ConfigScope) -> PlannedOperation {
    PlannedOperation {
        pending: PendingChange::new(set),
        operation,
        name: name.to_string(),
        scope,
    }
}
