//! Application data locations
//!
//! Profiles and the database live under one data directory, separate from
//! the Claude configuration the engine edits. Both are injectable so tests
//! can run against a temporary root.

use crate::profile::storage::StorageError;
use cfgscope_scanner::ClaudePaths;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Overrides the application data directory
pub const DATA_DIR_ENV: &str = "CFGSCOPE_DATA_DIR";

const DATABASE_FILE: &str = "cfgscope.db";

/// Where cfgscope keeps its own state, plus the Claude paths it manages
#[derive(Debug, Clone)]
pub struct DataPaths {
    data_dir: PathBuf,
    claude: ClaudePaths,
}

impl DataPaths {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, claude: ClaudePaths) -> Self {
        Self {
            data_dir: data_dir.into(),
            claude,
        }
    }

    /// `CFGSCOPE_DATA_DIR`, or `.cfgscope` under the resolved home
    pub fn from_env() -> Result<Self, StorageError> {
        let claude = ClaudePaths::from_env().map_err(|_| StorageError::NoHomeDir)?;
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map_or_else(|| claude.home().join(".cfgscope"), PathBuf::from);
        Ok(Self { data_dir, claude })
    }

    /// Data under `root/data`, fake home under `root/home`
    #[must_use]
    pub fn with_root(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            claude: ClaudePaths::with_home(root.join("home")),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn claude(&self) -> &ClaudePaths {
        &self.claude
    }

    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }

    #[must_use]
    pub fn profile_dir(&self, id: Uuid) -> PathBuf {
        self.profiles_dir().join(id.to_string())
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}
