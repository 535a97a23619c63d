//! Profile store errors

use super::storage::StorageError;
use super::types::ToolType;
use crate::apply::ApplyError;
use crate::storage::DatabaseError;
use cfgscope_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Tool index {index} out of range (profile has {len} tools)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Tool '{0}' has no captured source to track")]
    NoSourceRef(String),

    #[error("Source of '{name}' no longer exists at {path}")]
    SourceMissing { name: String, path: PathBuf },

    #[error("Profile has no tool named '{0}'")]
    UnknownTool(String),

    #[error("No {tool_type} named '{name}' found")]
    ToolNotFound { name: String, tool_type: ToolType },

    #[error("Cannot capture '{name}': {message}")]
    Capture { name: String, message: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}
