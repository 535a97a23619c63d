//! Project scope scanner
//!
//! Scans a project directory for:
//! - CLAUDE.md
//! - .claude/ with settings, skills, commands, agents
//! - .mcp.json
//! - local overrides: settings.local.json and local MCP servers in ~/.claude.json
//! - git repository information

use crate::error::{ScanError, ScanResult, ScanWarning};
use crate::hash::sha256_hex;
use crate::inventory::{GitInfo, ProjectScope};
use crate::parser::parse_local_mcp;
use crate::paths::ClaudePaths;
use crate::types::{FileInfo, Scope};
use std::path::Path;
use std::process::Command;

/// Scan a project directory
///
/// Fails only when `path` is not a directory; everything inside is
/// best-effort with skipped files reported through `warnings`.
pub fn scan_project(
    path: &Path,
    paths: &ClaudePaths,
    warnings: &mut Vec<ScanWarning>,
) -> ScanResult<ProjectScope> {
    if !path.exists() {
        return Err(ScanError::InvalidPath(format!(
            "Project path does not exist: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(ScanError::InvalidPath(format!(
            "Project path is not a directory: {}",
            path.display()
        )));
    }

    let name = path.file_name().map_or_else(
        || "unnamed".to_string(),
        |n| n.to_string_lossy().to_string(),
    );

    let claude_dir = ClaudePaths::project_claude_dir(path);
    let project = super::read_scope(path, &Scope::Project, warnings);
    let mut local = super::read_scope(path, &Scope::Local, warnings);
    local.mcp = super::files::read_optional(&paths.user_mcp_path(), warnings, |p, c| {
        parse_local_mcp(p, c, path)
    })
    .filter(|mcp| !mcp.servers.is_empty());

    Ok(ProjectScope {
        path: path.to_path_buf(),
        name,
        git: scan_git_info(path),
        claude_md: scan_claude_md(path, warnings),
        claude_dir: claude_dir.is_dir().then_some(claude_dir),
        project,
        local,
    })
}

fn scan_claude_md(project_path: &Path, warnings: &mut Vec<ScanWarning>) -> Option<FileInfo> {
    let claude_md_path = project_path.join("CLAUDE.md");
    super::files::read_optional(&claude_md_path, warnings, |p, content| {
        Ok(FileInfo {
            path: p.to_path_buf(),
            sha256: sha256_hex(content.as_bytes()),
            size: content.len() as u64,
        })
    })
}

fn scan_git_info(project_path: &Path) -> Option<GitInfo> {
    if !project_path.join(".git").exists() {
        return None;
    }

    let (branch, is_dirty) = get_git_status(project_path);
    let remote = get_git_remote(project_path);

    Some(GitInfo {
        remote,
        branch,
        is_dirty,
    })
}

/// A git command that ignores system and global config, so a cloned
/// repository cannot inject behaviour through them
fn secure_git_command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", if cfg!(windows) { "NUL" } else { "/dev/null" });
    cmd.env("GIT_ADVICE", "0");
    cmd
}

/// Branch name and dirty flag from a single `git status -sb`
fn get_git_status(project_path: &Path) -> (String, bool) {
    let output = secure_git_command()
        .args(["status", "-sb"])
        .current_dir(project_path)
        .output();

    match output {
        Ok(out) if out.status.success() => parse_status_output(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::debug!(
                path = %project_path.display(),
                stderr = %String::from_utf8_lossy(&out.stderr),
                "git status failed"
            );
            ("unknown".to_string(), false)
        }
        Err(e) => {
            tracing::debug!(path = %project_path.display(), error = %e, "git unavailable");
            ("unknown".to_string(), false)
        }
    }
}

/// First line is `## branch` or `## branch...origin/branch`; any further
/// line is a changed file
fn parse_status_output(stdout: &str) -> (String, bool) {
    let mut lines = stdout.lines();
    let branch = lines
        .next()
        .and_then(|line| line.strip_prefix("## "))
        .map(|rest| rest.split("...").next().unwrap_or(rest).to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let is_dirty = lines.next().is_some();
    (branch, is_dirty)
}

fn get_git_remote(project_path: &Path) -> Option<String> {
    let output = secure_git_command()
        .args(["remote", "get-url", "origin"])
        .current_dir(project_path)
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether a directory looks like it holds Claude configuration
#[must_use]
pub fn has_claude_config(dir: &Path) -> bool {
    dir.join(".claude").is_dir() || dir.join("CLAUDE.md").is_file() || dir.join(".mcp.json").is_file()
}
