//! Path and name validation shared by planners and the profile store

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Longest accepted item name
const MAX_NAME_LEN: usize = 128;

/// Errors related to path validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0}")]
    TraversalAttempt(String),

    #[error("Path escapes root directory: {0}")]
    EscapesRoot(String),

    #[error("Invalid path component: {0}")]
    InvalidComponent(String),

    #[error("Symlink not allowed: {0}")]
    SymlinkNotAllowed(String),
}

/// Join an untrusted relative path onto `root`
///
/// Rejects absolute paths and any `..` that would climb above `root`.
pub fn safe_join(root: &Path, untrusted_path: &Path) -> Result<PathBuf, PathError> {
    let normalized = normalize_path(untrusted_path)?;
    let joined = root.join(&normalized);
    verify_under_root(root, &joined)?;
    Ok(joined)
}

fn normalize_path(path: &Path) -> Result<PathBuf, PathError> {
    let mut normalized = PathBuf::new();
    let mut depth: usize = 0;

    for component in path.components() {
        match component {
            Component::Normal(c) => {
                if c.to_string_lossy().contains('\0') {
                    return Err(PathError::InvalidComponent("Null byte in path".to_string()));
                }
                normalized.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathError::TraversalAttempt(path.display().to_string()));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::InvalidComponent(
                    "Absolute path not allowed".to_string(),
                ));
            }
        }
    }

    Ok(normalized)
}

/// Logical check after normalization; canonical check when both exist
fn verify_under_root(root: &Path, path: &Path) -> Result<(), PathError> {
    if root.exists() && path.exists() {
        let escapes = || PathError::EscapesRoot(path.display().to_string());
        let canonical_root = root.canonicalize().map_err(|_| escapes())?;
        let canonical_path = path.canonicalize().map_err(|_| escapes())?;
        if !canonical_path.starts_with(&canonical_root) {
            return Err(escapes());
        }
    } else if !path.starts_with(root) {
        return Err(PathError::EscapesRoot(path.display().to_string()));
    }
    Ok(())
}

/// Validate a skill, agent or MCP server name for use in paths and JSON keys
pub fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::InvalidComponent("Empty name".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(PathError::InvalidComponent(format!(
            "Name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if name != name.trim() {
        return Err(PathError::InvalidComponent(format!(
            "Name cannot start or end with whitespace: {name:?}"
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains path separator: {name}"
        )));
    }
    if name.contains("..") {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains parent directory reference: {name}"
        )));
    }
    if name.starts_with('.') {
        return Err(PathError::InvalidComponent(format!(
            "Name cannot start with dot: {name}"
        )));
    }
    if name
        .chars()
        .any(|c| matches!(c, '\0' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
    {
        return Err(PathError::InvalidComponent(format!(
            "Name contains invalid characters: {name}"
        )));
    }
    Ok(())
}

/// Validate a command name, which may be namespaced as `group:name`
pub fn validate_command_name(name: &str) -> Result<(), PathError> {
    name.split(':').try_for_each(validate_name)
}

/// Relative path of a command file: `git:commit` -> `git/commit.md`
#[must_use]
pub fn command_rel_path(name: &str) -> PathBuf {
    let mut segments: Vec<&str> = name.split(':').collect();
    let last = segments.pop().unwrap_or_default();
    let mut path: PathBuf = segments.into_iter().collect();
    path.push(format!("{last}.md"));
    path
}

pub fn reject_symlink(path: &Path) -> Result<(), PathError> {
    if path.is_symlink() {
        return Err(PathError::SymlinkNotAllowed(path.display().to_string()));
    }
    Ok(())
}

/// Escape one JSON pointer reference token (RFC 6901)
#[must_use]
pub fn pointer_token(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
