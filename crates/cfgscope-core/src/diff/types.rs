//! Preview types for a pending change

use super::display::{format_preview_terminal, DiffSummary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a preview operation does to its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Modify,
    Delete,
}

/// One file operation in a preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOperation {
    pub operation_type: OperationKind,
    pub path: PathBuf,
    /// Unified diff; `None` for deletes
    pub diff: Option<String>,
    /// Bytes written, or removed for a delete
    pub size: u64,
}

/// Everything a caller needs to confirm a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPreview {
    pub summary: String,
    pub warnings: Vec<String>,
    pub terminal_output: String,
    pub operations: Vec<PreviewOperation>,
}

impl DiffPreview {
    #[must_use]
    pub fn new(title: &str, operations: Vec<PreviewOperation>, warnings: Vec<String>) -> Self {
        let summary = format!("{title}: {}", DiffSummary::from_operations(&operations).one_line());
        let terminal_output = format_preview_terminal(&summary, &operations, &warnings);
        Self {
            summary,
            warnings,
            terminal_output,
            operations,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Paths touched, in operation order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.operations.iter().map(|op| op.path.as_path())
    }

    /// Number of operations of one kind
    #[must_use]
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations
            .iter()
            .filter(|op| op.operation_type == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_serializes_lowercase() {
        let op = PreviewOperation {
            operation_type: OperationKind::Delete,
            path: PathBuf::from("/p/.mcp.json"),
            diff: None,
            size: 10,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operation_type"], "delete");
        assert!(json["diff"].is_null());
    }
}
