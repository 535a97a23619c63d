//! Managed scope scanner
//!
//! Organization-deployed configuration. Managed definitions take the highest
//! precedence and are never written by this tool.

use crate::error::ScanWarning;
use crate::inventory::ManagedScope;
use crate::paths::ClaudePaths;
use crate::types::Scope;

/// Scan managed configuration; `None` when nothing is deployed
pub fn scan_managed_scope(
    paths: &ClaudePaths,
    warnings: &mut Vec<ScanWarning>,
) -> Option<ManagedScope> {
    let contents = super::read_scope(paths.managed_root(), &Scope::Managed, warnings);
    if contents.is_empty() {
        None
    } else {
        Some(ManagedScope { contents })
    }
}
