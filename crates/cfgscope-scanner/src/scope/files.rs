//! Directory scanners shared by every scope

use crate::artifacts::{AgentInfo, CommandInfo, SkillInfo};
use crate::error::{ScanError, ScanResult, ScanWarning};
use crate::parser::{parse_agent, parse_command, parse_skill};
use crate::types::Scope;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Nesting limit for namespaced command directories
const MAX_COMMAND_DEPTH: usize = 4;

/// Read and parse an optional file
///
/// A missing file is `None`. A file that exists but cannot be read or parsed
/// is also `None`, with a warning recorded.
pub fn read_optional<T, F>(path: &Path, warnings: &mut Vec<ScanWarning>, parse: F) -> Option<T>
where
    F: FnOnce(&Path, &str) -> ScanResult<T>,
{
    if !path.is_file() {
        return None;
    }
    let result = fs::read_to_string(path)
        .map_err(ScanError::Io)
        .and_then(|content| parse(path, &content));
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            skip(path, &e, warnings);
            None
        }
    }
}

fn skip(path: &Path, err: &ScanError, warnings: &mut Vec<ScanWarning>) {
    tracing::warn!(path = %path.display(), error = %err, "skipping file");
    warnings.push(ScanWarning::from_error(path, err));
}

/// Entries of a directory in sorted order; missing directories are empty
fn sorted_entries(dir: &Path, warnings: &mut Vec<ScanWarning>) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
            paths.sort();
            paths
        }
        Err(e) => {
            skip(dir, &ScanError::Io(e), warnings);
            Vec::new()
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == "md")
}

/// Scan a directory of skill folders, each containing SKILL.md
pub fn scan_skills_directory(
    dir: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<SkillInfo> {
    sorted_entries(dir, warnings)
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|skill_dir| {
            let skill_file = skill_dir.join("SKILL.md");
            if !skill_file.is_file() {
                return None;
            }
            let parsed = fs::read_to_string(&skill_file)
                .map_err(ScanError::Io)
                .and_then(|content| parse_skill(&skill_dir, &content, scope.clone()));
            match parsed {
                Ok(skill) => Some(skill),
                Err(e) => {
                    skip(&skill_file, &e, warnings);
                    None
                }
            }
        })
        .collect()
}

/// Scan a directory of command files
///
/// Subdirectories namespace their commands: `commands/git/commit.md` is
/// the command `git:commit`.
pub fn scan_commands_directory(
    dir: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<CommandInfo> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut commands = Vec::new();
    let walker = WalkDir::new(dir)
        .max_depth(MAX_COMMAND_DEPTH)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                skip(&path, &ScanError::Io(e.into()), warnings);
                continue;
            }
        };
        let path = entry.path();
        if !is_markdown(path) {
            continue;
        }

        let parsed = fs::read_to_string(path)
            .map_err(ScanError::Io)
            .and_then(|content| parse_command(path, &content, scope.clone()));
        match parsed {
            Ok(mut command) => {
                if let Some(namespace) = command_namespace(dir, path) {
                    command.name = format!("{namespace}:{}", command.name);
                }
                commands.push(command);
            }
            Err(e) => skip(path, &e, warnings),
        }
    }
    commands
}

fn command_namespace(root: &Path, file: &Path) -> Option<String> {
    let parent = file.parent()?.strip_prefix(root).ok()?;
    let parts: Vec<String> = parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(":"))
    }
}

/// Scan a directory of agent markdown files
pub fn scan_agents_directory(
    dir: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<AgentInfo> {
    sorted_entries(dir, warnings)
        .into_iter()
        .filter(|p| is_markdown(p))
        .filter_map(|path| {
            let parsed = fs::read_to_string(&path)
                .map_err(ScanError::Io)
                .and_then(|content| parse_agent(&path, &content, scope.clone()));
            match parsed {
                Ok(agent) => Some(agent),
                Err(e) => {
                    skip(&path, &e, warnings);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_namespaced_commands() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("git")).unwrap();
        fs::write(dir.path().join("review.md"), "Review $ARGUMENTS").unwrap();
        fs::write(dir.path().join("git/commit.md"), "Commit it").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a command").unwrap();

        let mut warnings = Vec::new();
        let commands = scan_commands_directory(dir.path(), &Scope::User, &mut warnings);
        let mut names: Vec<_> = commands.iter().map(|c| c.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["git:commit", "review"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_agent_without_frontmatter_warns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.md"), "no frontmatter").unwrap();
        fs::write(
            dir.path().join("ok.md"),
            "---\nname: ok\ndescription: fine\n---\n",
        )
        .unwrap();

        let mut warnings = Vec::new();
        let agents = scan_agents_directory(dir.path(), &Scope::Project, &mut warnings);
        assert_eq!(agents.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, crate::error::WarningKind::Parse);
    }
}
