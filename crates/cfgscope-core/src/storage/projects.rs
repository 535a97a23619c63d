//! Registered project rows (CRUD)

use crate::project::Project;
use crate::storage::db::{decode, encode, parse_id, parse_timestamp, DatabaseError};
use cfgscope_scanner::ClaudePaths;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Project table operations
pub struct ProjectStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, project: &Project) -> Result<(), DatabaseError> {
        let json = encode(project, "project")?;
        self.conn.execute(
            r"
            INSERT INTO projects (id, name, path, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                project.id.to_string(),
                project.name,
                path_key(&project.path),
                json,
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        self.query_one("SELECT data FROM projects WHERE id = ?1", &id.to_string())
    }

    /// Lookup by path; relative and non-canonical spellings match too
    pub fn get_by_path(&self, path: &Path) -> Result<Option<Project>, DatabaseError> {
        let path = ClaudePaths::canonical_project(path);
        self.query_one("SELECT data FROM projects WHERE path = ?1", &path_key(&path))
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<Project>, DatabaseError> {
        let json: Option<String> = self
            .conn
            .query_row(sql, params![key], |row| row.get(0))
            .optional()?;
        json.map(|j| decode(&j, "project")).transpose()
    }

    /// Existing row for `path`, or a newly registered one
    ///
    /// Projects are registered under their canonical path.
    pub fn get_or_create(&self, path: &Path) -> Result<Project, DatabaseError> {
        if let Some(project) = self.get_by_path(path)? {
            return Ok(project);
        }
        let project = Project::new(ClaudePaths::canonical_project(path));
        self.create(&project)?;
        Ok(project)
    }

    /// All projects, sorted by name
    pub fn list(&self) -> Result<Vec<ProjectSummary>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, path, created_at, updated_at,
                   json_extract(data, '$.assigned_profile_id') AS profile_id
            FROM projects
            ORDER BY name
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut projects = Vec::new();
        for row in rows {
            let (id, name, path, created_at, updated_at, profile_id) = row?;
            projects.push(ProjectSummary {
                id: parse_id(&id)?,
                name,
                path: PathBuf::from(path),
                assigned_profile_id: profile_id.as_deref().map(parse_id).transpose()?,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }
        Ok(projects)
    }

    pub fn update(&self, project: &Project) -> Result<(), DatabaseError> {
        let json = encode(project, "project")?;
        let updated = self.conn.execute(
            r"
            UPDATE projects
            SET name = ?1, path = ?2, data = ?3, updated_at = ?4
            WHERE id = ?5
            ",
            params![
                project.name,
                path_key(&project.path),
                json,
                project.updated_at.to_rfc3339(),
                project.id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("project {}", project.id)));
        }
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }

    /// Projects whose assigned profile is `profile_id`
    pub fn list_by_profile(&self, profile_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT data FROM projects
            WHERE json_extract(data, '$.assigned_profile_id') = ?1
            ORDER BY name
            ",
        )?;
        let rows = stmt.query_map(params![profile_id.to_string()], |row| row.get::<_, String>(0))?;

        let mut projects = Vec::new();
        for json in rows {
            projects.push(decode(&json?, "project")?);
        }
        Ok(projects)
    }
}

fn path_key(path: &Path) -> String {
    path.display().to_string()
}

/// Project listing row
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub assigned_profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_project_crud_and_assignment() {
        let db = Database::in_memory().unwrap();
        let store = ProjectStore::new(db.connection());

        let mut project = store.get_or_create(Path::new("/work/app")).unwrap();
        assert_eq!(project.name, "app");
        let again = store.get_or_create(Path::new("/work/app")).unwrap();
        assert_eq!(again.id, project.id);
        let detour = store.get_or_create(Path::new("/work/other/../app/.")).unwrap();
        assert_eq!(detour.id, project.id);

        let profile_id = Uuid::new_v4();
        project.assigned_profile_id = Some(profile_id);
        store.update(&project).unwrap();

        let assigned = store.list_by_profile(profile_id).unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].path, PathBuf::from("/work/app"));
        assert!(store.list_by_profile(Uuid::new_v4()).unwrap().is_empty());

        let listed = store.list().unwrap();
        assert_eq!(listed[0].assigned_profile_id, Some(profile_id));

        assert!(store.delete(project.id).unwrap());
        assert!(store.get(project.id).unwrap().is_none());
    }
}
