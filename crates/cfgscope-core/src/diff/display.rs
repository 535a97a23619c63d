//! Diff display formatting for user review

use super::types::{OperationKind, PreviewOperation};
use std::fmt::Write;

/// Format a preview for terminal display
pub fn format_preview_terminal(
    summary: &str,
    operations: &[PreviewOperation],
    warnings: &[String],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "=== {summary} ===");
    let _ = writeln!(output);

    if !warnings.is_empty() {
        let _ = writeln!(output, "Warnings:");
        for warning in warnings {
            let _ = writeln!(output, "  [WARN] {warning}");
        }
        let _ = writeln!(output);
    }

    if operations.is_empty() {
        let _ = writeln!(output, "No changes.");
        return output;
    }

    for op in operations {
        let label = match op.operation_type {
            OperationKind::Create => "CREATE",
            OperationKind::Modify => "MODIFY",
            OperationKind::Delete => "DELETE",
        };
        let _ = writeln!(output, "{label}: {}", op.path.display());
        match &op.diff {
            Some(diff) => {
                for line in diff.lines() {
                    let _ = writeln!(output, "  {line}");
                }
            }
            None => {
                let _ = writeln!(output, "  Size: {} bytes", op.size);
            }
        }
        let _ = writeln!(output);
    }

    output
}

/// Summary statistics for a preview
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub creates: usize,
    pub modifies: usize,
    pub deletes: usize,
    /// Bytes written by creates and modifies
    pub total_bytes: u64,
}

impl DiffSummary {
    pub fn from_operations(operations: &[PreviewOperation]) -> Self {
        let mut summary = Self::default();

        for op in operations {
            match op.operation_type {
                OperationKind::Create => {
                    summary.creates += 1;
                    summary.total_bytes += op.size;
                }
                OperationKind::Modify => {
                    summary.modifies += 1;
                    summary.total_bytes += op.size;
                }
                OperationKind::Delete => summary.deletes += 1,
            }
        }

        summary
    }

    /// Format as a one-line summary
    pub fn one_line(&self) -> String {
        format!(
            "{} create(s), {} modify(s), {} delete(s) - {} bytes total",
            self.creates, self.modifies, self.deletes, self.total_bytes
        )
    }
}
