//! Diff rendering for change previews

pub mod display;
pub mod types;

pub use display::{format_preview_terminal, DiffSummary};
pub use types::{DiffPreview, OperationKind, PreviewOperation};

use similar::TextDiff;
use std::path::Path;

/// Unified diff of `old` against `new`; `None` renders as a new file
pub fn unified_diff(old: Option<&str>, new: &str, path: &Path) -> String {
    let display = path.display().to_string();
    let old_header = if old.is_some() {
        format!("a/{display}")
    } else {
        "/dev/null".to_string()
    };
    let new_header = format!("b/{display}");

    TextDiff::from_lines(old.unwrap_or(""), new)
        .unified_diff()
        .context_radius(3)
        .header(&old_header, &new_header)
        .to_string()
}
