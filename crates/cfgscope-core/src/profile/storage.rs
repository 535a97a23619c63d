//! Profile file storage
//!
//! Captured tool content lives under `<data>/profiles/<profile-id>/`:
//!
//! ```text
//! skills/<name>/...        commands/<group>/<name>.md
//! agents/<name>.md         mcp-servers/<name>.json
//! hooks/<name>.json        CLAUDE.md
//! ```
//!
//! Every store goes through a staging path and a rename, so a failed copy
//! never leaves a half-written tool behind.

use super::types::ToolType;
use crate::paths::DataPaths;
use crate::util::{command_rel_path, validate_command_name};
use cfgscope_scanner::hash::hash_dir;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;
use walkdir::WalkDir;

/// Maximum directory depth copied from a source
const MAX_DEPTH: usize = 50;

/// Maximum number of files copied from one source
const MAX_FILES: usize = 10_000;

/// Maximum size of one copied file (10 MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const CLAUDE_MD: &str = "CLAUDE.md";

/// Storage error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Home directory not found")]
    NoHomeDir,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

impl StorageError {
    fn io(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("{context}: {err}"))
    }
}

/// Names of the tools stored for a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileTools {
    pub mcp_servers: Vec<String>,
    pub skills: Vec<String>,
    pub commands: Vec<String>,
    pub agents: Vec<String>,
    pub hooks: Vec<String>,
    pub has_claude_md: bool,
}

/// One profile's storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFiles {
    root: PathBuf,
}

impl ProfileFiles {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn for_profile(paths: &DataPaths, id: Uuid) -> Self {
        Self::new(paths.profile_dir(id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a tool's content is stored; validates the name
    pub fn tool_path(&self, tool_type: ToolType, name: &str) -> Result<PathBuf, StorageError> {
        let path = match tool_type {
            ToolType::Skill => self.root.join("skills").join(sanitize_tool_name(name)?),
            ToolType::Command => {
                validate_command_name(name)
                    .map_err(|e| StorageError::InvalidName(e.to_string()))?;
                self.root.join("commands").join(command_rel_path(name))
            }
            ToolType::Agent => self
                .root
                .join("agents")
                .join(format!("{}.md", sanitize_tool_name(name)?)),
            ToolType::Mcp => self
                .root
                .join("mcp-servers")
                .join(format!("{}.json", sanitize_tool_name(name)?)),
            ToolType::Hook => self
                .root
                .join("hooks")
                .join(format!("{}.json", hook_file_stem(name)?)),
        };
        Ok(path)
    }

    /// Whether content for this tool is stored
    pub fn has_tool(&self, tool_type: ToolType, name: &str) -> bool {
        self.tool_path(tool_type, name).is_ok_and(|p| p.exists())
    }

    /// Copy a skill directory into storage, replacing any previous copy
    pub fn store_dir(&self, tool_type: ToolType, name: &str, src: &Path) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(tool_type, name)?;
        // A bare SKILL.md path stands for its directory
        let src = if src.is_file() && src.file_name().is_some_and(|n| n == "SKILL.md") {
            src.parent().unwrap_or(src)
        } else {
            src
        };
        self.replace_with(&dest, |staging| copy_dir_recursive(src, staging))?;
        Ok(dest)
    }

    /// Copy a single markdown file into storage
    pub fn store_file(&self, tool_type: ToolType, name: &str, src: &Path) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(tool_type, name)?;
        let metadata = fs::symlink_metadata(src).map_err(|e| StorageError::io(src.display(), e))?;
        if metadata.file_type().is_symlink() {
            return Err(StorageError::InvalidName(format!(
                "refusing to copy symlink {}",
                src.display()
            )));
        }
        check_file_size(src, metadata.len())?;
        self.replace_with(&dest, |staging| {
            fs::copy(src, staging)
                .map(|_| ())
                .map_err(|e| StorageError::io(src.display(), e))
        })?;
        Ok(dest)
    }

    /// Store a JSON document (MCP server or hook group)
    pub fn store_json(
        &self,
        tool_type: ToolType,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(tool_type, name)?;
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| StorageError::io("serialize", e))?;
        self.replace_with(&dest, |staging| {
            fs::write(staging, format!("{content}\n"))
                .map_err(|e| StorageError::io(staging.display(), e))
        })?;
        Ok(dest)
    }

    pub fn read_json(&self, tool_type: ToolType, name: &str) -> Result<serde_json::Value, StorageError> {
        let path = self.tool_path(tool_type, name)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("{tool_type} '{name}' is not stored in the profile"))
            } else {
                StorageError::io(path.display(), e)
            }
        })?;
        serde_json::from_str(&content).map_err(|e| StorageError::io(path.display(), e))
    }

    /// Returns whether anything was removed
    pub fn remove_tool(&self, tool_type: ToolType, name: &str) -> Result<bool, StorageError> {
        let path = self.tool_path(tool_type, name)?;
        remove_path(&path)
    }

    #[must_use]
    pub fn claude_md_path(&self) -> PathBuf {
        self.root.join(CLAUDE_MD)
    }

    pub fn store_claude_md(&self, src: &Path) -> Result<(), StorageError> {
        let dest = self.claude_md_path();
        let len = fs::metadata(src)
            .map_err(|e| StorageError::io(src.display(), e))?
            .len();
        check_file_size(src, len)?;
        self.replace_with(&dest, |staging| {
            fs::copy(src, staging)
                .map(|_| ())
                .map_err(|e| StorageError::io(src.display(), e))
        })
    }

    /// Inventory of stored content
    pub fn list(&self) -> Result<ProfileTools, StorageError> {
        let mut tools = ProfileTools {
            mcp_servers: list_stems(&self.root.join("mcp-servers"), "json")?,
            agents: list_stems(&self.root.join("agents"), "md")?,
            hooks: list_stems(&self.root.join("hooks"), "json")?,
            has_claude_md: self.claude_md_path().is_file(),
            ..ProfileTools::default()
        };

        let skills_dir = self.root.join("skills");
        if skills_dir.is_dir() {
            for entry in fs::read_dir(&skills_dir).map_err(|e| StorageError::io(skills_dir.display(), e))? {
                let entry = entry.map_err(|e| StorageError::io(skills_dir.display(), e))?;
                if entry.path().is_dir() {
                    tools.skills.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }

        // Nested command directories are namespaces: commands/git/commit.md -> git:commit
        let commands_dir = self.root.join("commands");
        if commands_dir.is_dir() {
            for entry in WalkDir::new(&commands_dir).follow_links(false) {
                let entry = entry.map_err(|e| StorageError::io(commands_dir.display(), e))?;
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "md") {
                    continue;
                }
                if let Ok(rel) = path.with_extension("").strip_prefix(&commands_dir) {
                    let name: Vec<String> = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    tools.commands.push(name.join(":"));
                }
            }
        }

        tools.skills.sort();
        tools.commands.sort();
        Ok(tools)
    }

    /// Hash of everything stored; `"empty"` when nothing is
    pub fn content_hash(&self) -> Result<String, StorageError> {
        if !self.root.exists() {
            return Ok("empty".to_string());
        }
        hash_dir(&self.root).map_err(|e| StorageError::io(self.root.display(), e))
    }

    pub fn delete_all(&self) -> Result<(), StorageError> {
        remove_path(&self.root).map(|_| ())
    }

    /// Build new content at a staging path, then swap it in over `dest`
    fn replace_with<F>(&self, dest: &Path, build: F) -> Result<(), StorageError>
    where
        F: FnOnce(&Path) -> Result<(), StorageError>,
    {
        let parent = dest
            .parent()
            .ok_or_else(|| StorageError::Io(format!("no parent for {}", dest.display())))?;
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent.display(), e))?;

        let staging = self.root.join(format!(".staging-{}", Uuid::new_v4().simple()));
        if let Err(err) = build(&staging) {
            let _ = remove_path(&staging);
            return Err(err);
        }

        remove_path(dest)?;
        fs::rename(&staging, dest).map_err(|e| {
            let _ = remove_path(&staging);
            StorageError::io(dest.display(), e)
        })
    }
}

fn list_stems(dir: &Path, ext: &str) -> Result<Vec<String>, StorageError> {
    let mut names = Vec::new();
    if !dir.is_dir() {
        return Ok(names);
    }
    for entry in fs::read_dir(dir).map_err(|e| StorageError::io(dir.display(), e))? {
        let path = entry.map_err(|e| StorageError::io(dir.display(), e))?.path();
        if path.extension().is_some_and(|e| e == ext) {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn remove_path(path: &Path) -> Result<bool, StorageError> {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return Ok(false);
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| StorageError::io(path.display(), e))?;
    Ok(true)
}

fn check_file_size(path: &Path, len: u64) -> Result<(), StorageError> {
    if len > MAX_FILE_SIZE {
        return Err(StorageError::LimitExceeded(format!(
            "{} exceeds maximum size of {MAX_FILE_SIZE} bytes",
            path.display()
        )));
    }
    Ok(())
}

/// Copy a directory tree
///
/// Symlinks are skipped. Depth, file count and file size are bounded.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if !src.is_dir() {
        return Err(StorageError::NotFound(format!(
            "directory {}",
            src.display()
        )));
    }

    let mut file_count = 0usize;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| StorageError::io(src.display(), e))?;
        if entry.depth() > MAX_DEPTH {
            return Err(StorageError::LimitExceeded(format!(
                "directory depth exceeds maximum of {MAX_DEPTH}"
            )));
        }
        if entry.path_is_symlink() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| StorageError::io(entry.path().display(), e))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| StorageError::io(target.display(), e))?;
            continue;
        }

        file_count += 1;
        if file_count > MAX_FILES {
            return Err(StorageError::LimitExceeded(format!(
                "file count exceeds maximum of {MAX_FILES}"
            )));
        }
        let len = entry
            .metadata()
            .map_err(|e| StorageError::io(entry.path().display(), e))?
            .len();
        check_file_size(entry.path(), len)?;
        fs::copy(entry.path(), &target).map_err(|e| StorageError::io(target.display(), e))?;
    }

    Ok(())
}

/// Sanitize a tool name (skill, agent, MCP server) for use as a file name
///
/// Rejects traversal; keeps alphanumerics, `-`, `_` and `.`, maps spaces to `-`.
pub fn sanitize_tool_name(name: &str) -> Result<String, StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("Tool name cannot be empty".to_string()));
    }
    if name.len() > 256 {
        return Err(StorageError::InvalidName(
            "Tool name too long (max 256 chars)".to_string(),
        ));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(StorageError::InvalidName(format!(
            "Tool name contains a path component: {name:?}"
        )));
    }

    let safe: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect();

    if safe.is_empty() || safe.starts_with('.') {
        return Err(StorageError::InvalidName(format!(
            "Tool name has no usable characters: {name:?}"
        )));
    }
    Ok(safe)
}

/// `PreToolUse:Edit|Write` -> `PreToolUse-Edit-Write`
fn hook_file_stem(name: &str) -> Result<String, StorageError> {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-').to_string();
    if stem.is_empty() {
        return Err(StorageError::InvalidName(format!("Invalid hook name: {name:?}")));
    }
    Ok(stem)
}
