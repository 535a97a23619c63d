//! User scope scanner

use crate::error::ScanWarning;
use crate::inventory::UserScope;
use crate::paths::ClaudePaths;
use crate::types::Scope;

/// Scan user-level configuration: `~/.claude/{skills,commands,agents}`,
/// `~/.claude/settings.json` hooks and `~/.claude.json` MCP servers
pub fn scan_user_scope(paths: &ClaudePaths, warnings: &mut Vec<ScanWarning>) -> UserScope {
    UserScope {
        contents: super::read_scope(paths.home(), &Scope::User, warnings),
    }
}
