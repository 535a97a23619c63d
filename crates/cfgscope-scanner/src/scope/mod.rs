//! Scope scanners
//!
//! [`scan_scope`] reads one scope root into tool records. The user, project
//! and managed scanners build the richer per-scope inventory types on top of
//! the same layout rules.

pub mod files;
pub mod managed;
pub mod project;
pub mod user;

use crate::error::ScanWarning;
use crate::inventory::ScopeContents;
use crate::parser::{parse_hooks_file, parse_mcp_config, parse_settings};
use crate::record::ToolRecord;
use crate::types::Scope;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use managed::scan_managed_scope;
pub use project::scan_project;
pub use user::scan_user_scope;

/// Result of scanning one scope root
#[derive(Debug, Clone, Serialize)]
pub struct ScopeScan {
    pub scope: Scope,
    pub records: Vec<ToolRecord>,
    pub warnings: Vec<ScanWarning>,
}

/// Scan one scope root into tool records
///
/// `root` is interpreted per scope: the home directory for `User`, the
/// project directory for `Project` and `Local`, the managed directory for
/// `Managed`, and the plugin install directory for `Plugin`. A root that
/// does not exist yields an empty scan. Files that cannot be read or parsed
/// are skipped and reported in `warnings`.
pub fn scan_scope(root: &Path, scope: Scope) -> ScopeScan {
    let mut warnings = Vec::new();
    let contents = read_scope(root, &scope, &mut warnings);
    ScopeScan {
        records: contents.records(&scope),
        scope,
        warnings,
    }
}

/// Where each kind of definition lives under a scope root
#[derive(Debug, Clone)]
pub(crate) struct ScopeLayout {
    /// Directory holding skills/, commands/, agents/ (if scanned)
    artifacts_dir: Option<PathBuf>,
    settings: Option<PathBuf>,
    mcp: Option<PathBuf>,
    hooks_file: Option<PathBuf>,
}

impl ScopeLayout {
    pub(crate) fn for_scope(root: &Path, scope: &Scope) -> Self {
        match scope {
            Scope::User => Self {
                artifacts_dir: Some(root.join(".claude")),
                settings: Some(root.join(".claude").join("settings.json")),
                mcp: Some(root.join(".claude.json")),
                hooks_file: None,
            },
            Scope::Project => Self {
                artifacts_dir: Some(root.join(".claude")),
                settings: Some(root.join(".claude").join("settings.json")),
                mcp: Some(root.join(".mcp.json")),
                hooks_file: None,
            },
            Scope::Local => Self {
                artifacts_dir: None,
                settings: Some(root.join(".claude").join("settings.local.json")),
                mcp: None,
                hooks_file: None,
            },
            Scope::Managed => Self {
                artifacts_dir: Some(root.to_path_buf()),
                settings: Some(root.join("managed-settings.json")),
                mcp: Some(root.join("managed-mcp.json")),
                hooks_file: None,
            },
            Scope::Plugin(_) => Self {
                artifacts_dir: Some(root.to_path_buf()),
                settings: None,
                mcp: Some(root.join(".mcp.json")),
                hooks_file: Some(root.join("hooks").join("hooks.json")),
            },
        }
    }
}

/// Read everything a scope root contributes
pub(crate) fn read_scope(
    root: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> ScopeContents {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), scope = %scope, "scope root missing");
        return ScopeContents::default();
    }

    let layout = ScopeLayout::for_scope(root, scope);
    let mut contents = ScopeContents::default();

    if let Some(dir) = &layout.artifacts_dir {
        contents.skills = files::scan_skills_directory(&dir.join("skills"), scope, warnings);
        contents.commands = files::scan_commands_directory(&dir.join("commands"), scope, warnings);
        contents.agents = files::scan_agents_directory(&dir.join("agents"), scope, warnings);
    }

    if let Some(path) = &layout.settings {
        contents.settings = files::read_optional(path, warnings, |p, c| parse_settings(p, c, scope));
        if let Some(settings) = &contents.settings {
            contents.hooks.extend(settings.hooks.iter().cloned());
        }
    }

    if let Some(path) = &layout.mcp {
        contents.mcp = files::read_optional(path, warnings, parse_mcp_config);
        if let (Some(mcp), Scope::Plugin(id)) = (contents.mcp.as_mut(), scope) {
            mcp.source_plugin = Some(id.clone());
        }
    }

    if let (Some(path), Scope::Plugin(id)) = (&layout.hooks_file, scope) {
        if let Some(hooks) = files::read_optional(path, warnings, |p, c| parse_hooks_file(p, c, id)) {
            contents.hooks.extend(hooks);
        }
    }

    tracing::debug!(
        root = %root.display(),
        scope = %scope,
        skills = contents.skills.len(),
        commands = contents.commands.len(),
        agents = contents.agents.len(),
        hooks = contents.hooks.len(),
        "scanned scope"
    );
    contents
}
