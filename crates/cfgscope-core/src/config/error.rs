//! Error types for config operations

use crate::apply::ApplyError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during config operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Item already exists in the specified scope
    #[error("Item '{name}' already exists in {scope} scope")]
    ItemExists { name: String, scope: String },

    #[error("Item '{name}' not found")]
    ItemNotFound { name: String },

    /// Item exists in multiple scopes and none was named
    #[error(
        "Item '{name}' exists in multiple scopes: {scopes:?}. Specify --scope to disambiguate"
    )]
    AmbiguousItem { name: String, scopes: Vec<String> },

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Cannot modify managed scope (read-only)")]
    ManagedScope,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error for {path}: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("JSON parse error in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl ConfigError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ItemExists { .. } => "ITEM_EXISTS",
            Self::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            Self::AmbiguousItem { .. } => "AMBIGUOUS_ITEM",
            Self::InvalidScope(_) => "INVALID_SCOPE",
            Self::ManagedScope => "PERMISSION_DENIED",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::IoError { .. } => "IO_ERROR",
            Self::JsonParseError { .. } => "PARSE_ERROR",
            Self::Apply(ApplyError::CommitConflict { .. }) => "CONFLICT",
            Self::Apply(ApplyError::CommitPartialFailure { .. }) => "PARTIAL_FAILURE",
            Self::Apply(ApplyError::InvalidState { .. }) => "INVALID_STATE",
            Self::Apply(ApplyError::Io { .. }) => "IO_ERROR",
        }
    }

    pub(crate) fn json(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::JsonParseError {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::IoError {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
