//! Database connection management

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use super::migrations;

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Could not create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at `path`, creating its directory
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        // WAL lets the CLI read while another process writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run_migrations(&conn)?;
        tracing::debug!(path = %path.display(), "opened database");

        Ok(Self { conn })
    }

    /// In-memory database for tests
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Decode a JSON blob column
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    json: &str,
    what: &str,
) -> Result<T, DatabaseError> {
    serde_json::from_str(json).map_err(|e| DatabaseError::Corrupt(format!("{what}: {e}")))
}

pub(crate) fn encode<T: serde::Serialize>(value: &T, what: &str) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Corrupt(format!("{what}: {e}")))
}

pub(crate) fn parse_timestamp(
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>, DatabaseError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|e| DatabaseError::Corrupt(format!("Invalid datetime {value:?}: {e}")))
}

pub(crate) fn parse_id(value: &str) -> Result<uuid::Uuid, DatabaseError> {
    uuid::Uuid::parse_str(value)
        .map_err(|e| DatabaseError::Corrupt(format!("Invalid UUID {value:?}: {e}")))
}
