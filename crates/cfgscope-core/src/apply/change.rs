//! Planned file changes
//!
//! Planners read disk through a [`ChangeSet`], which remembers the hash of
//! every file it planned against. The engine later refuses to write over a
//! file whose hash no longer matches.

use super::engine::ApplyError;
use super::lock::LockKey;
use cfgscope_scanner::hash::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// What to do with one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ChangeAction {
    /// Create or replace the file with this text
    Write(String),
    Delete,
}

/// One file to change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: PathBuf,
    /// SHA256 of the file when planned; `None` means it must not exist
    pub expected_hash: Option<String>,
    pub action: ChangeAction,
}

/// An ordered set of file changes for one operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub title: String,
    pub changes: Vec<FileChange>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Profile whose lock the commit must hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Uuid>,
    /// Directories to remove after commit if they end up empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prune_dirs: Vec<PathBuf>,
}

/// Contents and hash of a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiskState {
    pub bytes: Vec<u8>,
    pub hash: String,
}

impl DiskState {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Read a file's current state; a missing file is `None`
pub(crate) fn read_disk(path: &Path) -> Result<Option<DiskState>, ApplyError> {
    match fs::read(path) {
        Ok(bytes) => {
            let hash = sha256_hex(&bytes);
            Ok(Some(DiskState { bytes, hash }))
        }
        // A parent that is a file rather than a directory also means absent
        Err(e) if e.kind() == io::ErrorKind::NotFound || !path.exists() => Ok(None),
        Err(e) => Err(ApplyError::io(path, &e)),
    }
}

impl ChangeSet {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Serialize the commit against a profile
    #[must_use]
    pub fn for_profile(mut self, id: Uuid) -> Self {
        self.profile = Some(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Paths touched, in plan order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().map(|c| c.path.as_path())
    }

    /// Keys a commit of this set must hold
    #[must_use]
    pub fn lock_keys(&self) -> Vec<LockKey> {
        let mut keys: Vec<LockKey> = self.paths().map(|p| LockKey::File(p.to_path_buf())).collect();
        if let Some(id) = self.profile {
            keys.push(LockKey::Profile(id));
        }
        keys
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.changes.iter().position(|c| c.path == path)
    }

    /// Text the file will have after this set is applied, `None` if absent
    ///
    /// Planned changes win over disk, so later steps of one plan see the
    /// results of earlier ones.
    pub fn current_text(&self, path: &Path) -> Result<Option<String>, ApplyError> {
        if let Some(index) = self.position(path) {
            return Ok(match &self.changes[index].action {
                ChangeAction::Write(content) => Some(content.clone()),
                ChangeAction::Delete => None,
            });
        }
        Ok(read_disk(path)?.map(|state| state.text()))
    }

    /// Plan writing `content` to `path`
    ///
    /// Writing what is already on disk plans nothing. A second write to the
    /// same path replaces the first.
    pub fn write(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Result<(), ApplyError> {
        let path = path.into();
        let content = content.into();
        let disk = read_disk(&path)?;
        let unchanged = disk.as_ref().is_some_and(|d| d.bytes == content.as_bytes());

        match (self.position(&path), unchanged) {
            (Some(index), true) => {
                self.changes.remove(index);
            }
            (Some(index), false) => self.changes[index].action = ChangeAction::Write(content),
            (None, true) => {}
            (None, false) => self.changes.push(FileChange {
                path,
                expected_hash: disk.map(|d| d.hash),
                action: ChangeAction::Write(content),
            }),
        }
        Ok(())
    }

    /// Plan deleting `path`; deleting a file that does not exist plans nothing
    pub fn delete(&mut self, path: impl Into<PathBuf>) -> Result<(), ApplyError> {
        let path = path.into();
        let disk = read_disk(&path)?;

        match (self.position(&path), disk) {
            (Some(index), Some(_)) => self.changes[index].action = ChangeAction::Delete,
            (Some(index), None) => {
                self.changes.remove(index);
            }
            (None, Some(state)) => self.changes.push(FileChange {
                path,
                expected_hash: Some(state.hash),
                action: ChangeAction::Delete,
            }),
            (None, None) => {}
        }
        Ok(())
    }

    /// Plan deleting every file under `dir`, then the directory itself
    pub fn delete_tree(&mut self, dir: &Path) -> Result<(), ApplyError> {
        if !dir.is_dir() {
            return Ok(());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|e| ApplyError::Io {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_dir() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        for file in files {
            self.delete(file)?;
        }
        self.prune_dirs.push(dir.to_path_buf());
        Ok(())
    }

    /// Plan making `dest` a copy of the text files under `src`
    ///
    /// Files already in `dest` that `src` lacks are deleted. Symlinks are
    /// skipped; a file that is not UTF-8 text fails the plan.
    pub fn write_tree(&mut self, src: &Path, dest: &Path) -> Result<(), ApplyError> {
        let walk_err = |e: walkdir::Error| ApplyError::Io {
            path: src.to_path_buf(),
            message: e.to_string(),
        };

        let mut wanted = Vec::new();
        for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(walk_err)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(src).unwrap_or(entry.path()).to_path_buf();
            let content = fs::read_to_string(entry.path()).map_err(|e| ApplyError::io(entry.path(), &e))?;
            self.write(dest.join(&rel), content)?;
            wanted.push(rel);
        }

        if dest.is_dir() {
            let mut stale = Vec::new();
            for entry in WalkDir::new(dest).follow_links(false) {
                let entry = entry.map_err(walk_err)?;
                if entry.file_type().is_dir() {
                    continue;
                }
                let rel = entry.path().strip_prefix(dest).unwrap_or(entry.path());
                if !wanted.iter().any(|w| w == rel) {
                    stale.push(entry.path().to_path_buf());
                }
            }
            stale.sort();
            for path in stale {
                self.delete(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_records_disk_hash() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("a.txt");
        fs::write(&existing, "old").unwrap();

        let mut set = ChangeSet::new("test");
        set.write(&existing, "new").unwrap();
        set.write(dir.path().join("b.txt"), "fresh").unwrap();

        assert_eq!(set.changes[0].expected_hash, Some(sha256_hex(b"old")));
        assert_eq!(set.changes[1].expected_hash, None);
    }

    #[test]
    fn test_unchanged_write_is_dropped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("same.txt");
        fs::write(&file, "same").unwrap();

        let mut set = ChangeSet::new("test");
        set.write(&file, "same").unwrap();
        assert!(set.is_empty());

        set.write(&file, "other").unwrap();
        set.write(&file, "same").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_current_text_sees_planned_changes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("x.json");
        fs::write(&file, "{}").unwrap();

        let mut set = ChangeSet::new("test");
        assert_eq!(set.current_text(&file).unwrap().as_deref(), Some("{}"));
        set.write(&file, "{\"a\":1}").unwrap();
        assert_eq!(set.current_text(&file).unwrap().as_deref(), Some("{\"a\":1}"));
        set.delete(&file).unwrap();
        assert_eq!(set.current_text(&file).unwrap(), None);
        assert_eq!(set.changes.len(), 1);
        assert_eq!(set.changes[0].action, ChangeAction::Delete);
    }

    #[test]
    fn test_delete_missing_plans_nothing() {
        let dir = TempDir::new().unwrap();
        let mut set = ChangeSet::new("test");
        set.delete(dir.path().join("missing")).unwrap();
        set.delete_tree(&dir.path().join("missing-dir")).unwrap();
        assert!(set.is_empty());
        assert!(set.prune_dirs.is_empty());
    }

    #[test]
    fn test_delete_tree_lists_files() {
        let dir = TempDir::new().unwrap();
        let skill = dir.path().join("skill");
        fs::create_dir_all(skill.join("scripts")).unwrap();
        fs::write(skill.join("SKILL.md"), "x").unwrap();
        fs::write(skill.join("scripts/run.sh"), "y").unwrap();

        let mut set = ChangeSet::new("test");
        set.delete_tree(&skill).unwrap();
        assert_eq!(set.changes.len(), 2);
        assert_eq!(set.prune_dirs, vec![skill]);
    }

    #[test]
    fn test_write_tree_mirrors_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(src.join("docs")).unwrap();
        fs::write(src.join("SKILL.md"), "new").unwrap();
        fs::write(src.join("docs/a.md"), "a").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("SKILL.md"), "new").unwrap();
        fs::write(dest.join("stale.md"), "old").unwrap();

        let mut set = ChangeSet::new("test");
        set.write_tree(&src, &dest).unwrap();
        let planned: Vec<(&Path, &ChangeAction)> =
            set.changes.iter().map(|c| (c.path.as_path(), &c.action)).collect();
        assert_eq!(
            planned,
            vec![
                (dest.join("docs/a.md").as_path(), &ChangeAction::Write("a".into())),
                (dest.join("stale.md").as_path(), &ChangeAction::Delete),
            ]
        );
    }
}
