//! Error types for the scanner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur during scanning
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse frontmatter
    #[error("Failed to parse frontmatter: {0}")]
    FrontmatterParse(String),

    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// No frontmatter found in file
    #[error("No frontmatter found in file")]
    NoFrontmatter,

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// External command failed
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Home directory not found
    #[error("Home directory not found")]
    HomeNotFound,

    /// Precedence could not pick a single winner
    #[error("Collision has no resolvable winner: {0}")]
    CollisionAmbiguous(String),
}

impl ScanError {
    /// Whether this error came from malformed content rather than IO
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::FrontmatterParse(_) | Self::JsonParse(_) | Self::MissingField(_) | Self::NoFrontmatter
        )
    }
}

/// Category of a non-fatal scan problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// File or directory could not be read
    ScanIo,
    /// File was read but its content is malformed
    Parse,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ScanIo => "io",
            Self::Parse => "parse",
        })
    }
}

/// A file that was skipped during a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: WarningKind,
    pub message: String,
}

impl ScanWarning {
    /// Build a warning from the error that caused the skip
    #[must_use]
    pub fn from_error(path: impl Into<PathBuf>, err: &ScanError) -> Self {
        let kind = if err.is_parse() {
            WarningKind::Parse
        } else {
            WarningKind::ScanIo
        };
        Self {
            path: path.into(),
            kind,
            message: err.to_string(),
        }
    }
}
