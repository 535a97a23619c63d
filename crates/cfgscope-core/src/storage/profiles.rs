//! Profile rows (CRUD)
//!
//! The whole [`Profile`] is stored as JSON in `data`; `name` and
//! `description` are duplicated into columns for listing and uniqueness.

use crate::profile::Profile;
use crate::storage::db::{decode, encode, parse_id, parse_timestamp, DatabaseError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

/// Profile table operations
pub struct ProfileTable<'a> {
    conn: &'a Connection,
}

impl<'a> ProfileTable<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, profile: &Profile) -> Result<(), DatabaseError> {
        let json = encode(profile, "profile")?;
        self.conn.execute(
            r"
            INSERT INTO profiles (id, name, description, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                profile.id.to_string(),
                profile.name,
                profile.description,
                json,
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        self.query_one("SELECT data FROM profiles WHERE id = ?1", &id.to_string())
    }

    /// Names are unique, compared exactly
    pub fn get_by_name(&self, name: &str) -> Result<Option<Profile>, DatabaseError> {
        self.query_one("SELECT data FROM profiles WHERE name = ?1", name)
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<Profile>, DatabaseError> {
        let json: Option<String> = self
            .conn
            .query_row(sql, params![key], |row| row.get(0))
            .optional()?;
        json.map(|j| decode(&j, "profile")).transpose()
    }

    /// All profiles, sorted by name
    pub fn list(&self) -> Result<Vec<ProfileSummary>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, description, created_at, updated_at,
                   COALESCE(json_array_length(data, '$.tool_refs'), 0) AS tool_count,
                   COALESCE(json_array_length(data, '$.assigned_projects'), 0) AS project_count
            FROM profiles
            ORDER BY name
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut profiles = Vec::new();
        for row in rows {
            let (id, name, description, created_at, updated_at, tool_count, project_count) = row?;
            profiles.push(ProfileSummary {
                id: parse_id(&id)?,
                name,
                description,
                tool_count: usize::try_from(tool_count).unwrap_or(0),
                project_count: usize::try_from(project_count).unwrap_or(0),
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }
        Ok(profiles)
    }

    pub fn update(&self, profile: &Profile) -> Result<(), DatabaseError> {
        let json = encode(profile, "profile")?;
        let updated = self.conn.execute(
            r"
            UPDATE profiles
            SET name = ?1, description = ?2, data = ?3, updated_at = ?4
            WHERE id = ?5
            ",
            params![
                profile.name,
                profile.description,
                json,
                profile.updated_at.to_rfc3339(),
                profile.id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("profile {}", profile.id)));
        }
        Ok(())
    }

    /// Returns whether a row was removed
    pub fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }
}

/// Profile listing row
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tool_count: usize,
    pub project_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ToolRef, ToolType};
    use crate::storage::Database;

    #[test]
    fn test_profile_crud() {
        let db = Database::in_memory().unwrap();
        let table = ProfileTable::new(db.connection());

        let mut profile = Profile::new("web".into());
        profile.tool_refs.push(ToolRef::new("lint", ToolType::Skill));
        table.create(&profile).unwrap();

        assert_eq!(table.get(profile.id).unwrap().unwrap().name, "web");
        assert!(table.get_by_name("web").unwrap().is_some());
        assert!(table.get_by_name("Web").unwrap().is_none());

        let listed = table.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tool_count, 1);

        profile.description = Some("frontend".into());
        table.update(&profile).unwrap();
        assert_eq!(
            table.get(profile.id).unwrap().unwrap().description.as_deref(),
            Some("frontend")
        );

        assert!(table.delete(profile.id).unwrap());
        assert!(!table.delete(profile.id).unwrap());
        assert!(matches!(
            table.update(&profile),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = Database::in_memory().unwrap();
        let table = ProfileTable::new(db.connection());
        table.create(&Profile::new("same".into())).unwrap();
        assert!(table.create(&Profile::new("same".into())).is_err());
    }
}
