//! Profile update detection
//!
//! Tracked tools are compared against their source; pinned tools never
//! report drift. Checking is read-only and never fails: a source that can
//! no longer be read is listed in `missing_sources` instead.

use super::capture::{location_of, source_hash};
use super::storage::ProfileFiles;
use super::types::{Profile, SourceMode, SourceRef, ToolType};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// A tracked tool whose source changed since the last copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolUpdateInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub source_path: PathBuf,
    /// Hash at the time the tool was copied
    pub old_hash: String,
    pub new_hash: String,
    pub mode: SourceMode,
}

/// Result of checking a profile for updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCheck {
    pub updates: Vec<ToolUpdateInfo>,
    /// Tracked tools whose source no longer exists
    pub missing_sources: Vec<String>,
    /// Tracked tools examined
    pub total_checked: usize,
}

impl UpdateCheck {
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    pub fn has_update(&self, name: &str) -> bool {
        self.updates.iter().any(|u| u.name.eq_ignore_ascii_case(name))
    }

    /// Tool name -> has-update, for every tracked tool examined
    pub fn update_map(&self, profile: &Profile) -> BTreeMap<String, bool> {
        profile
            .tool_refs
            .iter()
            .filter(|t| t.source_ref.as_ref().is_some_and(|s| s.mode == SourceMode::Track))
            .map(|t| (t.name.clone(), self.has_update(&t.name)))
            .collect()
    }
}

/// Compare every tracked tool in `profile` with its source
pub fn check_profile_updates(profile: &Profile) -> UpdateCheck {
    let mut result = UpdateCheck::default();

    for tool in &profile.tool_refs {
        let Some(source_ref) = &tool.source_ref else {
            continue;
        };
        if source_ref.mode == SourceMode::Pin {
            continue;
        }
        result.total_checked += 1;

        match source_hash(tool.tool_type, &location_of(source_ref)) {
            Ok(Some(current)) if current != source_ref.source_hash => {
                result.updates.push(ToolUpdateInfo {
                    name: tool.name.clone(),
                    tool_type: tool.tool_type,
                    source_path: source_ref.source_path.clone(),
                    old_hash: source_ref.source_hash.clone(),
                    new_hash: current,
                    mode: source_ref.mode,
                });
            }
            Ok(Some(_)) => {}
            Ok(None) => result.missing_sources.push(tool.name.clone()),
            Err(e) => {
                warn!(tool = %tool.name, path = %source_ref.source_path.display(), error = %e, "cannot read tracked source");
                result.missing_sources.push(tool.name.clone());
            }
        }
    }

    result
}

/// Record a fresh copy in a source ref
pub fn update_source_hash(source_ref: &mut SourceRef, new_hash: String) {
    source_ref.source_hash = new_hash;
    source_ref.copied_at = Utc::now().to_rfc3339();
}

/// Whether any stored tool predates source tracking
pub fn needs_migration(profile: &Profile, files: &ProfileFiles) -> bool {
    profile
        .tool_refs
        .iter()
        .any(|tool| tool.source_ref.is_none() && files.has_tool(tool.tool_type, &tool.name))
}

/// Give stored tools without a source ref a pinned placeholder
///
/// Their origin is unknown, so they can never report drift. Bare references
/// with no stored content are left alone. Returns whether anything changed.
pub fn migrate_legacy_profile(profile: &mut Profile, files: &ProfileFiles) -> bool {
    let mut changed = false;
    for tool in &mut profile.tool_refs {
        if tool.source_ref.is_none() && files.has_tool(tool.tool_type, &tool.name) {
            tool.source_ref = Some(SourceRef {
                source_path: PathBuf::new(),
                entry: None,
                hook: None,
                source_hash: "legacy".to_string(),
                mode: SourceMode::Pin,
                copied_at: Utc::now().to_rfc3339(),
            });
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::ToolRef;
    use cfgscope_scanner::hash::hash_file;
    use std::fs;
    use tempfile::TempDir;

    fn tracked(name: &str, path: PathBuf, hash: String, mode: SourceMode) -> ToolRef {
        let mut tool = ToolRef::new(name, ToolType::Agent);
        tool.source_ref = Some(SourceRef {
            source_path: path,
            entry: None,
            hook: None,
            source_hash: hash,
            mode,
            copied_at: Utc::now().to_rfc3339(),
        });
        tool
    }

    #[test]
    fn test_detects_drift_and_missing() {
        let dir = TempDir::new().unwrap();
        let changed = dir.path().join("changed.md");
        let same = dir.path().join("same.md");
        fs::write(&changed, "v1").unwrap();
        fs::write(&same, "v1").unwrap();
        let hash = hash_file(&same).unwrap();

        let mut profile = Profile::new("p".into());
        profile.tool_refs = vec![
            tracked("changed", changed.clone(), hash.clone(), SourceMode::Track),
            tracked("same", same, hash.clone(), SourceMode::Track),
            tracked("pinned", changed.clone(), hash.clone(), SourceMode::Pin),
            tracked("gone", dir.path().join("gone.md"), hash.clone(), SourceMode::Track),
            ToolRef::new("bare", ToolType::Skill),
        ];
        fs::write(&changed, "v2").unwrap();

        let check = check_profile_updates(&profile);
        assert_eq!(check.total_checked, 3);
        assert_eq!(check.updates.len(), 1);
        assert!(check.has_update("CHANGED"));
        assert!(!check.has_update("pinned"));
        assert_eq!(check.missing_sources, vec!["gone"]);

        let map = check.update_map(&profile);
        assert_eq!(map.get("changed"), Some(&true));
        assert_eq!(map.get("same"), Some(&false));
        assert!(!map.contains_key("pinned"));
    }

    #[test]
    fn test_migration_only_touches_stored_tools() {
        let dir = TempDir::new().unwrap();
        let files = ProfileFiles::new(dir.path());
        files
            .store_json(ToolType::Mcp, "db", &serde_json::json!({"command": "pg"}))
            .unwrap();

        let mut profile = Profile::new("legacy".into());
        profile.tool_refs = vec![
            ToolRef::new("db", ToolType::Mcp),
            ToolRef::new("bare", ToolType::Skill),
        ];
        assert!(needs_migration(&profile, &files));
        assert!(migrate_legacy_profile(&mut profile, &files));
        assert_eq!(
            profile.tool_refs[0].source_ref.as_ref().map(|s| s.mode),
            Some(SourceMode::Pin)
        );
        assert!(profile.tool_refs[1].source_ref.is_none());
        assert!(!needs_migration(&profile, &files));
    }
}
