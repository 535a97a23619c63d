//! CLI command implementations

pub mod mcp;
pub mod profile;
pub mod scan;
pub mod skill;
pub mod tool;

use cfgscope_core::config::{ConfigScope, OperationResult};
use cfgscope_core::DiffPreview;

/// Print a change preview and say whether it was applied
pub fn print_preview(preview: &DiffPreview, dry_run: bool) {
    if preview.is_empty() && preview.warnings.is_empty() {
        println!("No changes needed.");
        return;
    }
    print!("{}", preview.terminal_output);
    if dry_run {
        println!("\nDry run - no changes made.");
    } else {
        println!("\nApplied {} operations.", preview.operations.len());
    }
}

/// Print a config operation, as JSON or as its preview
pub fn print_result(result: &OperationResult, dry_run: bool, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    match &result.preview {
        Some(preview) => print_preview(preview, dry_run),
        None => println!("No changes needed."),
    }
    Ok(())
}

pub fn parse_scope(scope: Option<&str>) -> anyhow::Result<Option<ConfigScope>> {
    scope
        .map(|s| s.parse::<ConfigScope>().map_err(anyhow::Error::msg))
        .transpose()
}
