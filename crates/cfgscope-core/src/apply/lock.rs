//! Process-wide lock registry
//!
//! Writes are serialized per target file and profile mutations per profile.
//! A guard takes all of its keys at once, so two operations that share any
//! key run one after the other and no lock ordering can deadlock.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use uuid::Uuid;

/// Something that at most one operation may touch at a time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Profile(Uuid),
    File(PathBuf),
}

#[derive(Default)]
struct Registry {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::default)
}

/// Holds a set of keys until dropped
#[derive(Debug)]
#[must_use = "the keys are released when the guard is dropped"]
pub struct LockGuard {
    keys: Vec<LockKey>,
}

impl LockGuard {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

/// Block until every key is free, then hold them all
///
/// Not reentrant: acquiring a key the current thread already holds blocks
/// forever.
pub fn acquire(keys: impl IntoIterator<Item = LockKey>) -> LockGuard {
    let mut keys: Vec<LockKey> = keys.into_iter().collect();
    keys.sort();
    keys.dedup();

    let registry = registry();
    let mut held = registry
        .held
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    while keys.iter().any(|key| held.contains(key)) {
        held = registry
            .released
            .wait(held)
            .unwrap_or_else(PoisonError::into_inner);
    }
    held.extend(keys.iter().cloned());
    tracing::trace!(count = keys.len(), "locks acquired");

    LockGuard { keys }
}

/// Lock one profile
pub fn lock_profile(id: Uuid) -> LockGuard {
    acquire([LockKey::Profile(id)])
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let registry = registry();
        let mut held = registry
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        registry.released.notify_all();
    }
}
