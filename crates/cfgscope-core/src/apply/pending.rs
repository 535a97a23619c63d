//! Two-step confirmation for a planned change

use super::change::ChangeSet;
use super::engine::{execute, ApplyError, ApplyMode};
use crate::diff::DiffPreview;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a [`PendingChange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Drafted,
    Previewed,
    Committed,
    Aborted,
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drafted => "drafted",
            Self::Previewed => "previewed",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        })
    }
}

/// A change set that must be previewed before it can be committed
///
/// `Drafted -> Previewed -> Committed`, or `Aborted` from either of the
/// first two. A failed commit also ends in `Aborted`; the error says which
/// operations made it to disk.
#[derive(Debug, Clone)]
pub struct PendingChange {
    set: ChangeSet,
    state: ChangeState,
    preview: Option<DiffPreview>,
}

impl PendingChange {
    #[must_use]
    pub fn new(set: ChangeSet) -> Self {
        Self {
            set,
            state: ChangeState::Drafted,
            preview: None,
        }
    }

    pub fn state(&self) -> ChangeState {
        self.state
    }

    pub fn change_set(&self) -> &ChangeSet {
        &self.set
    }

    pub fn last_preview(&self) -> Option<&DiffPreview> {
        self.preview.as_ref()
    }

    /// Dry run; may be repeated while not yet committed
    pub fn preview(&mut self) -> Result<DiffPreview, ApplyError> {
        if !matches!(self.state, ChangeState::Drafted | ChangeState::Previewed) {
            return Err(ApplyError::InvalidState {
                state: self.state,
                action: "preview",
            });
        }
        let preview = execute(&self.set, ApplyMode::Preview)?;
        self.state = ChangeState::Previewed;
        self.preview = Some(preview.clone());
        Ok(preview)
    }

    /// Write the previewed changes
    pub fn commit(&mut self) -> Result<DiffPreview, ApplyError> {
        if self.state != ChangeState::Previewed {
            return Err(ApplyError::InvalidState {
                state: self.state,
                action: "commit",
            });
        }
        match execute(&self.set, ApplyMode::Write) {
            Ok(preview) => {
                self.state = ChangeState::Committed;
                self.preview = Some(preview.clone());
                Ok(preview)
            }
            Err(err) => {
                self.state = ChangeState::Aborted;
                Err(err)
            }
        }
    }

    pub fn abort(&mut self) -> Result<(), ApplyError> {
        if !matches!(self.state, ChangeState::Drafted | ChangeState::Previewed) {
            return Err(ApplyError::InvalidState {
                state: self.state,
                action: "abort",
            });
        }
        self.state = ChangeState::Aborted;
        Ok(())
    }
}
