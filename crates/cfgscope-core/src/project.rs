//! Registered projects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A project known to cfgscope, optionally tied to one profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub path: PathBuf,
    pub name: String,
    pub assigned_profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Register `path`, named after its last component
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            path,
            name,
            assigned_profile_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Point the project at `profile`, or clear it with `None`
    pub fn assign(&mut self, profile: Option<Uuid>) {
        self.assigned_profile_id = profile;
        self.updated_at = Utc::now();
    }
}
