//! Main scanner implementation

use crate::collision::{detect_collisions, CollisionReport};
use crate::error::{ScanResult, ScanWarning};
use crate::inventory::{Inventory, ManagedScope, ProjectScanFailure, ProjectScope, UserScope};
use crate::paths::ClaudePaths;
use crate::plugins::PluginInventory;
use crate::scope::{managed, project, user};
use crate::types::HostInfo;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The main scanner struct
#[derive(Debug, Clone)]
pub struct Scanner {
    paths: ClaudePaths,
    /// Whether to include managed scope
    pub include_managed: bool,
}

type Scanned<T> = (T, Vec<ScanWarning>);

impl Scanner {
    /// Create a scanner over the given configuration roots
    #[must_use]
    pub fn new(paths: ClaudePaths) -> Self {
        Self {
            paths,
            include_managed: false,
        }
    }

    /// Enable scanning managed scope
    #[must_use]
    pub fn with_managed(mut self, include: bool) -> Self {
        self.include_managed = include;
        self
    }

    #[must_use]
    pub fn paths(&self) -> &ClaudePaths {
        &self.paths
    }

    /// Perform a full inventory scan
    ///
    /// User, managed, plugin and project scans run in parallel. Results are
    /// merged by scope identity: projects are keyed by path, so input order
    /// and duplicate entries do not change the outcome. A project that
    /// cannot be scanned is recorded in `failures` and the rest carry on.
    #[must_use]
    pub fn scan_all(&self, project_paths: &[PathBuf]) -> Inventory {
        let unique: BTreeMap<PathBuf, PathBuf> = project_paths
            .iter()
            .map(|p| (canonical_key(p), p.clone()))
            .collect();

        let ((user, managed), (plugins, projects)) = rayon::join(
            || {
                rayon::join(
                    || self.scan_user_scope(),
                    || self.scan_managed_if_enabled(),
                )
            },
            || {
                rayon::join(
                    || self.scan_plugins(),
                    || self.scan_projects(&unique),
                )
            },
        );

        let (user_scope, mut warnings) = user;
        let (managed_scope, managed_warnings) = managed;
        let (plugins, plugin_warnings) = plugins;
        warnings.extend(managed_warnings);
        warnings.extend(plugin_warnings);

        let mut scanned = Vec::new();
        let mut failures = Vec::new();
        for (path, (result, project_warnings)) in projects {
            warnings.extend(project_warnings);
            match result {
                Ok(scope) => scanned.push(scope),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "project scan failed");
                    failures.push(ProjectScanFailure {
                        path,
                        error: error.to_string(),
                    });
                }
            }
        }

        let mut inventory = Inventory {
            host: HostInfo::current(self.paths.home().to_path_buf()),
            user_scope,
            managed_scope,
            projects: scanned,
            plugins,
            collisions: CollisionReport::default(),
            failures,
            warnings,
            scanned_at: Utc::now(),
        };
        inventory.collisions = detect_collisions(&inventory);

        tracing::debug!(
            projects = inventory.projects.len(),
            failures = inventory.failures.len(),
            warnings = inventory.warnings.len(),
            collisions = inventory.collisions.total_count(),
            "inventory built"
        );
        inventory
    }

    /// Scan user-level scope
    #[must_use]
    pub fn scan_user_scope(&self) -> Scanned<UserScope> {
        let mut warnings = Vec::new();
        let scope = user::scan_user_scope(&self.paths, &mut warnings);
        (scope, warnings)
    }

    /// Scan managed scope; `None` when nothing is deployed
    #[must_use]
    pub fn scan_managed_scope(&self) -> Scanned<Option<ManagedScope>> {
        let mut warnings = Vec::new();
        let scope = managed::scan_managed_scope(&self.paths, &mut warnings);
        (scope, warnings)
    }

    /// Scan a single project directory
    pub fn scan_project(&self, path: &Path) -> Scanned<ScanResult<ProjectScope>> {
        let mut warnings = Vec::new();
        let result = project::scan_project(path, &self.paths, &mut warnings);
        (result, warnings)
    }

    /// Scan installed plugins from the Claude plugins directory
    #[must_use]
    pub fn scan_plugins(&self) -> Scanned<PluginInventory> {
        let mut warnings = Vec::new();
        let plugins = PluginInventory::scan(&self.paths, &mut warnings);
        (plugins, warnings)
    }

    fn scan_managed_if_enabled(&self) -> Scanned<Option<ManagedScope>> {
        if self.include_managed {
            self.scan_managed_scope()
        } else {
            (None, Vec::new())
        }
    }

    fn scan_projects(
        &self,
        unique: &BTreeMap<PathBuf, PathBuf>,
    ) -> BTreeMap<PathBuf, Scanned<ScanResult<ProjectScope>>> {
        unique
            .par_iter()
            .map(|(key, path)| {
                tracing::debug!(path = %path.display(), "scanning project");
                (key.clone(), self.scan_project(key))
            })
            .collect()
    }
}

/// Canonical form used to merge duplicate project inputs
///
/// Paths that cannot be canonicalized (typically missing ones) are kept
/// as given so the failure is reported against the user's input.
fn canonical_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_empty_home() {
        let home = TempDir::new().unwrap();
        let inventory = Scanner::new(ClaudePaths::with_home(home.path())).scan_all(&[]);
        assert!(inventory.projects.is_empty());
        assert!(inventory.failures.is_empty());
        assert!(inventory.managed_scope.is_none());
        assert!(!inventory.collisions.has_collisions());
    }

    #[test]
    fn test_duplicate_project_inputs_scan_once() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::create_dir_all(project.path().join(".claude")).unwrap();

        let inputs = vec![
            project.path().to_path_buf(),
            project.path().join("."),
            project.path().to_path_buf(),
        ];
        let inventory = Scanner::new(ClaudePaths::with_home(home.path())).scan_all(&inputs);
        assert_eq!(inventory.projects.len(), 1);
    }

    #[test]
    fn test_missing_project_is_a_failure_not_an_abort() {
        let home = TempDir::new().unwrap();
        let good = TempDir::new().unwrap();
        let missing = good.path().join("does-not-exist");

        let inventory = Scanner::new(ClaudePaths::with_home(home.path()))
            .scan_all(&[missing.clone(), good.path().to_path_buf()]);
        assert_eq!(inventory.projects.len(), 1);
        assert_eq!(inventory.failures.len(), 1);
        assert_eq!(inventory.failures[0].path, missing);
    }
}
