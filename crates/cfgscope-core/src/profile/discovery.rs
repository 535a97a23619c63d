//! Finding candidate projects under a development folder

use super::storage::StorageError;
use super::types::ProjectInfo;
use cfgscope_scanner::scope::project::has_claude_config;
use std::path::Path;
use walkdir::WalkDir;

/// How deep [`discover_projects`] looks by default
pub const DEFAULT_MAX_DEPTH: usize = 4;

const SKIPPED_DIRS: [&str; 3] = ["node_modules", "target", "vendor"];

/// Directories under `folder` holding Claude configuration
///
/// A directory counts when it has `.claude/`, `CLAUDE.md` or `.mcp.json`.
/// Hidden and dependency directories are skipped, and nothing below a
/// discovered project is searched. Sorted by path.
pub fn discover_projects(folder: &Path, max_depth: usize) -> Result<Vec<ProjectInfo>, StorageError> {
    if !folder.is_dir() {
        return Err(StorageError::NotFound(format!(
            "folder {}",
            folder.display()
        )));
    }

    let mut projects = Vec::new();
    let mut walker = WalkDir::new(folder)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_name().to_str().is_some_and(|name| {
                    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
                })
        });

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if has_claude_config(entry.path()) {
            projects.push(ProjectInfo::from_path(entry.path()));
            walker.skip_current_dir();
        }
    }

    projects.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(folder = %folder.display(), found = projects.len(), "discovered projects");
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_configured_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("api/.claude")).unwrap();
        fs::create_dir_all(root.join("web")).unwrap();
        fs::write(root.join("web/CLAUDE.md"), "# web").unwrap();
        fs::create_dir_all(root.join("tools/cli")).unwrap();
        fs::write(root.join("tools/cli/.mcp.json"), "{}").unwrap();
        fs::create_dir_all(root.join("plain/src")).unwrap();
        fs::create_dir_all(root.join("web/node_modules/dep/.claude")).unwrap();
        fs::create_dir_all(root.join("api/nested/.claude")).unwrap();
        fs::create_dir_all(root.join(".hidden/.claude")).unwrap();

        let found = discover_projects(root, DEFAULT_MAX_DEPTH).unwrap();
        let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["api", "cli", "web"]);
    }

    #[test]
    fn test_depth_limit() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c/.claude")).unwrap();
        assert!(discover_projects(dir.path(), 2).unwrap().is_empty());
        assert_eq!(discover_projects(dir.path(), 3).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_folder() {
        assert!(matches!(
            discover_projects(Path::new("/definitely/not/here"), 2),
            Err(StorageError::NotFound(_))
        ));
    }
}
