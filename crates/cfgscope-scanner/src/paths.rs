//! Locations of Claude configuration on disk
//!
//! All scanner and config code resolves paths through [`ClaudePaths`] so
//! tests can point the whole engine at a temporary home directory.

use crate::error::{ScanError, ScanResult};
use std::path::{Component, Path, PathBuf};

/// Overrides the home directory used for user scope
pub const HOME_ENV: &str = "CFGSCOPE_HOME";
/// Overrides the managed (organization) configuration directory
pub const MANAGED_ENV: &str = "CFGSCOPE_MANAGED_DIR";

/// Root locations for every Claude configuration scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudePaths {
    home: PathBuf,
    managed_root: PathBuf,
}

impl ClaudePaths {
    /// Resolve paths from the environment, falling back to the real home
    pub fn from_env() -> ScanResult<Self> {
        let home = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir().ok_or(ScanError::HomeNotFound)?,
        };
        let managed_root = std::env::var_os(MANAGED_ENV)
            .map_or_else(default_managed_root, PathBuf::from);
        Ok(Self { home, managed_root })
    }

    /// Use `home` as the user home; managed scope lives under `home/managed`
    #[must_use]
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let managed_root = home.join("managed");
        Self { home, managed_root }
    }

    /// Use explicit home and managed roots
    #[must_use]
    pub fn with_roots(home: impl Into<PathBuf>, managed_root: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            managed_root: managed_root.into(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn managed_root(&self) -> &Path {
        &self.managed_root
    }

    // ---------------------------------------------------------------------
    // User scope
    // ---------------------------------------------------------------------

    /// `~/.claude`
    #[must_use]
    pub fn user_claude_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    /// `~/.claude/settings.json`
    #[must_use]
    pub fn user_settings_path(&self) -> PathBuf {
        self.user_claude_dir().join("settings.json")
    }

    /// `~/.claude.json`, which holds user MCP servers and per-project local servers
    #[must_use]
    pub fn user_mcp_path(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    /// `~/.claude/plugins`
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.user_claude_dir().join("plugins")
    }

    /// `~/.claude/plugins/installed_plugins.json`
    #[must_use]
    pub fn installed_plugins_path(&self) -> PathBuf {
        self.plugins_dir().join("installed_plugins.json")
    }

    // ---------------------------------------------------------------------
    // Managed scope
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn managed_settings_path(&self) -> PathBuf {
        self.managed_root.join("managed-settings.json")
    }

    #[must_use]
    pub fn managed_mcp_path(&self) -> PathBuf {
        self.managed_root.join("managed-mcp.json")
    }

    // ---------------------------------------------------------------------
    // Project scope
    // ---------------------------------------------------------------------

    /// `<project>/.claude`
    #[must_use]
    pub fn project_claude_dir(project: &Path) -> PathBuf {
        project.join(".claude")
    }

    /// `<project>/.mcp.json`
    #[must_use]
    pub fn project_mcp_path(project: &Path) -> PathBuf {
        project.join(".mcp.json")
    }

    /// `<project>/.claude/settings.json`
    #[must_use]
    pub fn project_settings_path(project: &Path) -> PathBuf {
        Self::project_claude_dir(project).join("settings.json")
    }

    /// `<project>/.claude/settings.local.json`
    #[must_use]
    pub fn local_settings_path(project: &Path) -> PathBuf {
        Self::project_claude_dir(project).join("settings.local.json")
    }

    /// Key under `projects` in `~/.claude.json` for a project's local servers
    #[must_use]
    pub fn local_mcp_key(project: &Path) -> String {
        Self::canonical_project(project)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Absolute, canonical form of a project path
    ///
    /// Relative paths resolve against the current directory. A path that
    /// cannot be canonicalized (typically a missing one) is cleaned up
    /// lexically instead.
    #[must_use]
    pub fn canonical_project(project: &Path) -> PathBuf {
        if let Ok(canonical) = std::fs::canonicalize(project) {
            return canonical;
        }
        let absolute = if project.is_absolute() {
            project.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| project.to_path_buf(), |cwd| cwd.join(project))
        };
        let mut clean = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    clean.pop();
                }
                other => clean.push(other.as_os_str()),
            }
        }
        clean
    }
}

fn default_managed_root() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support/ClaudeCode")
    }
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(r"C:\ProgramData\ClaudeCode")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        PathBuf::from("/etc/claude")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_home_layout() {
        let paths = ClaudePaths::with_home("/tmp/h");
        assert_eq!(paths.user_claude_dir(), PathBuf::from("/tmp/h/.claude"));
        assert_eq!(paths.user_mcp_path(), PathBuf::from("/tmp/h/.claude.json"));
        assert_eq!(
            paths.installed_plugins_path(),
            PathBuf::from("/tmp/h/.claude/plugins/installed_plugins.json")
        );
        assert_eq!(paths.managed_root(), Path::new("/tmp/h/managed"));
    }

    #[test]
    fn test_project_paths() {
        let project = Path::new("/work/app");
        assert_eq!(
            ClaudePaths::local_settings_path(project),
            PathBuf::from("/work/app/.claude/settings.local.json")
        );
        assert_eq!(
            ClaudePaths::project_mcp_path(project),
            PathBuf::from("/work/app/.mcp.json")
        );
        assert_eq!(ClaudePaths::local_mcp_key(project), "/work/app");
        assert_eq!(ClaudePaths::local_mcp_key(Path::new("/work/tmp/../app/.")), "/work/app");
    }

    #[test]
    fn test_canonical_project_resolves_existing_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(dir.path().join("other")).unwrap();
        std::fs::create_dir_all(&app).unwrap();

        let detour = dir.path().join("other/../app");
        assert_eq!(
            ClaudePaths::canonical_project(&detour),
            std::fs::canonicalize(&app).unwrap()
        );
        assert!(ClaudePaths::canonical_project(Path::new("relative/app")).is_absolute());
    }
}
