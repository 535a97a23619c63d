//! Operation results shared by the config managers

use super::error::{ConfigError, ConfigResult};
use super::scope::ConfigScope;
use crate::apply::PendingChange;
use crate::diff::DiffPreview;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Add,
    Remove,
    Update,
    Move,
    Create,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Update => write!(f, "update"),
            Self::Move => write!(f, "move"),
            Self::Create => write!(f, "create"),
        }
    }
}

/// Result of a config operation, previewed or committed
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub operation: OperationType,
    pub name: String,
    /// Scope written to (the target, for moves)
    pub scope: ConfigScope,
    /// Files written, or that would be written in a dry run
    pub files_modified: Vec<PathBuf>,
    /// Whether anything reached disk
    pub committed: bool,
    /// Unified diffs of every operation, concatenated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<DiffPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl OperationResult {
    fn from_preview(
        operation: OperationType,
        name: &str,
        scope: ConfigScope,
        preview: DiffPreview,
        committed: bool,
    ) -> Self {
        let diffs: Vec<&str> = preview
            .operations
            .iter()
            .filter_map(|op| op.diff.as_deref())
            .collect();
        Self {
            success: true,
            operation,
            name: name.to_string(),
            scope,
            files_modified: preview.paths().map(PathBuf::from).collect(),
            committed,
            diff: (!diffs.is_empty()).then(|| diffs.concat()),
            warnings: preview.warnings.clone(),
            preview: Some(preview),
            error: None,
        }
    }

    /// A failed operation, for callers reporting errors as data
    pub fn failure(operation: OperationType, name: impl Into<String>, scope: ConfigScope, error: &ConfigError) -> Self {
        Self {
            success: false,
            operation,
            name: name.into(),
            scope,
            files_modified: Vec::new(),
            committed: false,
            diff: None,
            preview: None,
            error: Some(format!("{}: {error}", error.code())),
            warnings: Vec::new(),
        }
    }
}

/// A planned config change waiting to be previewed and committed
#[derive(Debug)]
pub struct PlannedOperation {
    pub pending: PendingChange,
    pub operation: OperationType,
    pub name: String,
    pub scope: ConfigScope,
}

impl PlannedOperation {
    /// Preview, then commit unless `dry_run`
    ///
    /// Both steps run the same engine, so a dry run shows exactly what a
    /// real run writes.
    pub fn run(mut self, dry_run: bool) -> ConfigResult<OperationResult> {
        let preview = self.pending.preview()?;
        if dry_run {
            self.pending.abort()?;
            return Ok(OperationResult::from_preview(
                self.operation,
                &self.name,
                self.scope,
                preview,
                false,
            ));
        }
        let committed = self.pending.commit()?;
        Ok(OperationResult::from_preview(
            self.operation,
            &self.name,
            self.scope,
            committed,
            true,
        ))
    }
}
