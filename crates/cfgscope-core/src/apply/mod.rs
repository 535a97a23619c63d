//! Diff/apply engine

pub mod change;
pub mod engine;
pub mod lock;
pub mod pending;

pub use change::{ChangeAction, ChangeSet, FileChange};
pub use engine::{execute, ApplyError, ApplyMode};
pub use pending::{ChangeState, PendingChange};
