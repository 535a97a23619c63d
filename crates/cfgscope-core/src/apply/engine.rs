//! Preview and commit share one code path
//!
//! [`execute`] validates every planned change against disk, renders the
//! preview and, in [`ApplyMode::Write`], performs the writes. A dry run and
//! a commit of the same plan therefore see the same diffs.

use super::change::{read_disk, ChangeAction, ChangeSet, FileChange};
use super::lock;
use super::pending::ChangeState;
use crate::diff::{unified_diff, DiffPreview, OperationKind, PreviewOperation};
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Whether [`execute`] may touch disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Preview,
    Write,
}

/// Errors from previewing or committing a change set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// A file changed since the plan was made; nothing was written
    #[error("Conflict: {path} changed since the preview (operation {index})")]
    CommitConflict { index: usize, path: PathBuf },

    /// Some operations were written before one failed
    #[error(
        "Partial commit: operations {succeeded:?} were applied, operation {failed_index} ({path}) failed: {message}"
    )]
    CommitPartialFailure {
        succeeded: Vec<usize>,
        failed_index: usize,
        path: PathBuf,
        message: String,
    },

    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Cannot {action} a change that is {state}")]
    InvalidState {
        state: ChangeState,
        action: &'static str,
    },
}

impl ApplyError {
    pub(crate) fn io(path: &Path, err: &io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Index of the operation to retry from, when one is known
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::CommitConflict { index, .. } => Some(*index),
            Self::CommitPartialFailure { failed_index, .. } => Some(*failed_index),
            _ => None,
        }
    }
}

/// Render `set` and, in write mode, apply it
///
/// In write mode the file locks for every target (and the owning profile)
/// are held from validation through the last write.
pub fn execute(set: &ChangeSet, mode: ApplyMode) -> Result<DiffPreview, ApplyError> {
    let _guard = match mode {
        ApplyMode::Write => Some(lock::acquire(set.lock_keys())),
        ApplyMode::Preview => None,
    };

    let mut operations = Vec::with_capacity(set.changes.len());
    for (index, change) in set.changes.iter().enumerate() {
        let disk = read_disk(&change.path)?;
        let current_hash = disk.as_ref().map(|d| d.hash.as_str());
        if current_hash != change.expected_hash.as_deref() {
            return Err(ApplyError::CommitConflict {
                index,
                path: change.path.clone(),
            });
        }
        operations.push(preview_operation(change, disk.map(|d| d.text())));
    }

    let preview = DiffPreview::new(&set.title, operations, set.warnings.clone());
    if mode == ApplyMode::Preview {
        debug!(title = %set.title, operations = set.changes.len(), "previewed change set");
        return Ok(preview);
    }

    commit(set)?;
    for dir in &set.prune_dirs {
        prune_empty_dirs(dir);
    }
    info!(title = %set.title, files = set.changes.len(), "committed change set");
    Ok(preview)
}

fn preview_operation(change: &FileChange, old: Option<String>) -> PreviewOperation {
    let path = change.path.clone();
    match (&change.action, old) {
        (ChangeAction::Write(content), None) => PreviewOperation {
            operation_type: OperationKind::Create,
            diff: Some(unified_diff(None, content, &path)),
            size: content.len() as u64,
            path,
        },
        (ChangeAction::Write(content), Some(old)) => PreviewOperation {
            operation_type: OperationKind::Modify,
            diff: Some(unified_diff(Some(&old), content, &path)),
            size: content.len() as u64,
            path,
        },
        (ChangeAction::Delete, old) => PreviewOperation {
            operation_type: OperationKind::Delete,
            diff: None,
            size: old.map_or(0, |o| o.len() as u64),
            path,
        },
    }
}

fn commit(set: &ChangeSet) -> Result<(), ApplyError> {
    let mut succeeded = Vec::with_capacity(set.changes.len());
    for (index, change) in set.changes.iter().enumerate() {
        if let Err(err) = apply_one(index, change) {
            if succeeded.is_empty() {
                return Err(err);
            }
            let message = match &err {
                ApplyError::CommitConflict { .. } => "file changed since the preview".to_string(),
                ApplyError::Io { message, .. } => message.clone(),
                other => other.to_string(),
            };
            return Err(ApplyError::CommitPartialFailure {
                succeeded,
                failed_index: index,
                path: change.path.clone(),
                message,
            });
        }
        succeeded.push(index);
    }
    Ok(())
}

fn apply_one(index: usize, change: &FileChange) -> Result<(), ApplyError> {
    // Re-check right before touching the file
    let current = read_disk(&change.path)?.map(|d| d.hash);
    if current != change.expected_hash {
        return Err(ApplyError::CommitConflict {
            index,
            path: change.path.clone(),
        });
    }

    match &change.action {
        ChangeAction::Write(content) => write_atomic(&change.path, content.as_bytes()),
        ChangeAction::Delete => match fs::remove_file(&change.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApplyError::io(&change.path, &e)),
        },
    }
}

/// Write through a sibling temp file and rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ApplyError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| ApplyError::io(parent, &e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

    let result = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(ApplyError::io(path, &e));
    }
    Ok(())
}

/// Remove `dir` and its subdirectories when nothing is left in them
fn prune_empty_dirs(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            prune_empty_dirs(&path);
        }
    }
    // Fails harmlessly when the directory still has content
    if fs::remove_dir(dir).is_ok() {
        debug!(path = %dir.display(), "removed empty directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preview_does_not_write() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("new.txt");
        let mut set = ChangeSet::new("create");
        set.write(&target, "hello\n").unwrap();

        let preview = execute(&set, ApplyMode::Preview).unwrap();
        assert!(!target.exists());
        assert_eq!(preview.operations.len(), 1);
        assert_eq!(preview.operations[0].operation_type, OperationKind::Create);
        assert!(preview.operations[0].diff.as_deref().unwrap().contains("+hello"));
    }

    #[test]
    fn test_write_matches_preview() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.txt");
        fs::write(&target, "one\ntwo\n").unwrap();
        let mut set = ChangeSet::new("modify");
        set.write(&target, "one\nthree\n").unwrap();

        let preview = execute(&set, ApplyMode::Preview).unwrap();
        let written = execute(&set, ApplyMode::Write).unwrap();
        assert_eq!(preview, written);
        assert_eq!(fs::read_to_string(&target).unwrap(), "one\nthree\n");
    }

    #[test]
    fn test_delete_has_no_diff() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("gone.txt");
        fs::write(&target, "12345").unwrap();
        let mut set = ChangeSet::new("delete");
        set.delete(&target).unwrap();

        let preview = execute(&set, ApplyMode::Write).unwrap();
        assert_eq!(preview.operations[0].operation_type, OperationKind::Delete);
        assert_eq!(preview.operations[0].diff, None);
        assert_eq!(preview.operations[0].size, 5);
        assert!(!target.exists());
    }

    #[test]
    fn test_conflict_before_any_write() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&second, "v1").unwrap();

        let mut set = ChangeSet::new("two files");
        set.write(&first, "new").unwrap();
        set.write(&second, "v2").unwrap();
        fs::write(&second, "edited elsewhere").unwrap();

        let err = execute(&set, ApplyMode::Write).unwrap_err();
        assert_eq!(
            err,
            ApplyError::CommitConflict {
                index: 1,
                path: second.clone()
            }
        );
        assert!(!first.exists());
        assert_eq!(fs::read_to_string(&second).unwrap(), "edited elsewhere");
    }

    #[test]
    fn test_partial_failure_reports_succeeded() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.txt");
        // A regular file where the second target needs a directory
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let second = blocker.join("child.txt");

        let set = ChangeSet {
            title: "partial".into(),
            changes: vec![
                FileChange {
                    path: first.clone(),
                    expected_hash: None,
                    action: ChangeAction::Write("a".into()),
                },
                FileChange {
                    path: second.clone(),
                    expected_hash: None,
                    action: ChangeAction::Write("b".into()),
                },
            ],
            ..ChangeSet::default()
        };

        match execute(&set, ApplyMode::Write).unwrap_err() {
            ApplyError::CommitPartialFailure {
                succeeded,
                failed_index,
                path,
                ..
            } => {
                assert_eq!(succeeded, vec![0]);
                assert_eq!(failed_index, 1);
                assert_eq!(path, second);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&first).unwrap(), "a");
    }

    #[test]
    fn test_prunes_emptied_dirs() {
        let dir = TempDir::new().unwrap();
        let skill = dir.path().join("skills/demo");
        fs::create_dir_all(skill.join("refs")).unwrap();
        fs::write(skill.join("SKILL.md"), "x").unwrap();
        fs::write(skill.join("refs/a.md"), "y").unwrap();

        let mut set = ChangeSet::new("remove skill");
        set.delete_tree(&skill).unwrap();
        execute(&set, ApplyMode::Write).unwrap();

        assert!(!skill.exists());
        assert!(dir.path().join("skills").exists());
    }
}
