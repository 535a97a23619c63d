//! Profile store
//!
//! [`ProfileStore`] is the only writer of profiles. Rows live in SQLite,
//! captured content under the profile's storage directory. Every mutation
//! holds the per-profile lock from the apply registry, so updates and pulls
//! never interleave with an install committing from the same profile.

use super::capture::{capture_record, location_of, source_hash, store_from_source};
use super::discovery::{discover_projects, DEFAULT_MAX_DEPTH};
use super::error::ProfileError;
use super::storage::{ProfileFiles, StorageError};
use super::types::{Profile, ProfilePluginRef, ProjectInfo, SourceMode, ToolPermissions, ToolRef, ToolType};
use super::updates::{check_profile_updates, migrate_legacy_profile, update_source_hash, UpdateCheck};
use crate::apply::lock::{acquire, lock_profile, LockKey};
use crate::paths::DataPaths;
use crate::project::Project;
use crate::storage::{Database, ProfileSummary, ProfileTable, ProjectStore, ProjectSummary};
use crate::util::validate_name;
use cfgscope_scanner::{Scanner, Scope, ToolRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What a new profile starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Empty,
    /// Capture every project and local tool of one project
    Project(PathBuf),
    Projects(Vec<PathBuf>),
    /// Discover projects below a folder, then capture them all
    Folder(PathBuf),
}

/// Where [`ProfileStore::add_tools_from_source`] reads tools from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSource {
    Project(PathBuf),
    User,
}

/// One tool to capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub tool_type: ToolType,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, tool_type: ToolType) -> Self {
        Self {
            name: name.into(),
            tool_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureFailure {
    pub name: String,
    pub tool_type: ToolType,
    pub message: String,
}

/// Outcome of a batch capture; each tool succeeds or fails on its own
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<CaptureFailure>,
    /// Projects that could not be scanned at all
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_projects: Vec<PathBuf>,
}

impl CaptureReport {
    fn fail(&mut self, name: &str, tool_type: ToolType, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(CaptureFailure {
            name: name.to_string(),
            tool_type,
            message: message.into(),
        });
    }
}

/// Result of pulling a tracked tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullOutcome {
    /// False when the profile already held the current content
    pub changed: bool,
    pub new_hash: String,
}

/// Profiles, their stored content and project assignments
pub struct ProfileStore {
    paths: DataPaths,
    db: Database,
}

impl ProfileStore {
    /// Open (or create) the database under `paths`
    pub fn open(paths: DataPaths) -> Result<Self, ProfileError> {
        let db = Database::open(&paths.database_path())?;
        Ok(Self { paths, db })
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Registered projects
    pub fn projects(&self) -> ProjectStore<'_> {
        ProjectStore::new(self.db.connection())
    }

    fn table(&self) -> ProfileTable<'_> {
        ProfileTable::new(self.db.connection())
    }

    #[must_use]
    pub fn files(&self, id: Uuid) -> ProfileFiles {
        ProfileFiles::for_profile(&self.paths, id)
    }

    fn scanner(&self) -> Scanner {
        Scanner::new(self.paths.claude().clone())
    }

    fn load(&self, id: Uuid) -> Result<Profile, ProfileError> {
        self.table()
            .get(id)?
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }

    fn save(&self, profile: &Profile) -> Result<(), ProfileError> {
        self.table().update(profile)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<ProfileSummary>, ProfileError> {
        Ok(self.table().list()?)
    }

    /// Load a profile, upgrading pre-tracking content on the way
    pub fn get(&self, id: Uuid) -> Result<Profile, ProfileError> {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        if migrate_legacy_profile(&mut profile, &self.files(id)) {
            info!(profile = %profile.name, "migrated legacy tool references");
            self.save(&profile)?;
        }
        Ok(profile)
    }

    /// Look up by id or exact name
    pub fn find(&self, name_or_id: &str) -> Result<Profile, ProfileError> {
        if let Ok(id) = Uuid::parse_str(name_or_id) {
            return self.get(id);
        }
        let profile = self
            .table()
            .get_by_name(name_or_id)?
            .ok_or_else(|| ProfileError::NotFound(name_or_id.to_string()))?;
        self.get(profile.id)
    }

    /// Create a profile, capturing tools from `source`
    ///
    /// Every project and local tool of each source project is captured in
    /// track mode; the first project with a CLAUDE.md contributes it. Tools
    /// already captured under the same name and type are skipped. A single
    /// unreadable project fails the call; with several, it is skipped and
    /// reported.
    pub fn create(
        &self,
        name: &str,
        source: ProfileSource,
        description: Option<String>,
    ) -> Result<(Profile, CaptureReport), ProfileError> {
        validate_name(name).map_err(|e| ProfileError::Validation(e.to_string()))?;
        if self.table().get_by_name(name)?.is_some() {
            return Err(ProfileError::Validation(format!(
                "a profile named '{name}' already exists"
            )));
        }

        let (project_paths, strict) = match source {
            ProfileSource::Empty => (Vec::new(), false),
            ProfileSource::Project(path) => (vec![path], true),
            ProfileSource::Projects(paths) => (paths, false),
            ProfileSource::Folder(folder) => (
                discover_projects(&folder, DEFAULT_MAX_DEPTH)?
                    .into_iter()
                    .map(|p| p.path)
                    .collect(),
                false,
            ),
        };

        let mut profile = Profile::new(name.to_string());
        profile.description = description;
        let _guard = lock_profile(profile.id);
        let files = self.files(profile.id);

        let report = match self.capture_projects(&mut profile, &files, &project_paths, strict) {
            Ok(report) => report,
            Err(e) => {
                files.delete_all()?;
                return Err(e);
            }
        };

        if let Err(e) = self.table().create(&profile) {
            files.delete_all()?;
            return Err(e.into());
        }
        info!(
            profile = %profile.name,
            tools = profile.tool_refs.len(),
            failed = report.failed,
            "created profile"
        );
        Ok((profile, report))
    }

    fn capture_projects(
        &self,
        profile: &mut Profile,
        files: &ProfileFiles,
        project_paths: &[PathBuf],
        strict: bool,
    ) -> Result<CaptureReport, ProfileError> {
        let scanner = self.scanner();
        let mut report = CaptureReport::default();

        for path in project_paths {
            let (scanned, _warnings) = scanner.scan_project(path);
            let scope = match scanned {
                Ok(scope) => scope,
                Err(e) if strict => return Err(e.into()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping project");
                    report.skipped_projects.push(path.clone());
                    continue;
                }
            };

            for record in scope.records() {
                let candidate = ToolRef::new(record.name.clone(), record.kind.into());
                if profile.has_tool(&candidate) {
                    debug!(name = %record.name, "tool already captured, skipping");
                    continue;
                }
                capture_into(profile, files, &record, Some(&scope.path), SourceMode::Track, &mut report);
            }

            if !profile.has_claude_md {
                if let Some(claude_md) = &scope.claude_md {
                    files.store_claude_md(&claude_md.path)?;
                    profile.has_claude_md = true;
                }
            }
        }

        Ok(report)
    }

    /// Append bare references; duplicates by name and type are ignored
    pub fn add_tools(&self, id: Uuid, refs: Vec<ToolRef>) -> Result<Profile, ProfileError> {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        for tool in refs {
            if !profile.has_tool(&tool) {
                profile.tool_refs.push(tool);
            }
        }
        profile.touch();
        self.save(&profile)?;
        Ok(profile)
    }

    /// Capture the named tools' content from one scope
    ///
    /// Each tool is captured independently: a missing or unreadable tool is
    /// reported in the result while the rest are still added.
    pub fn add_tools_from_source(
        &self,
        id: Uuid,
        source: &ToolSource,
        specs: &[ToolSpec],
        mode: SourceMode,
    ) -> Result<CaptureReport, ProfileError> {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        let files = self.files(id);

        let scanner = self.scanner();
        let (records, project): (Vec<ToolRecord>, Option<&Path>) = match source {
            ToolSource::User => {
                let (user, _warnings) = scanner.scan_user_scope();
                (user.contents.records(&Scope::User), None)
            }
            ToolSource::Project(path) => {
                let (scanned, _warnings) = scanner.scan_project(path);
                (scanned?.records(), Some(path.as_path()))
            }
        };

        let mut report = CaptureReport::default();
        for spec in specs {
            let candidate = ToolRef::new(spec.name.clone(), spec.tool_type);
            if profile.has_tool(&candidate) {
                report.fail(&spec.name, spec.tool_type, "already in profile");
                continue;
            }
            let kind = spec.tool_type.kind();
            let Some(record) = records
                .iter()
                .find(|r| r.kind == kind && r.name_matches(&spec.name))
            else {
                report.fail(&spec.name, spec.tool_type, "not found in source");
                continue;
            };
            capture_into(&mut profile, &files, record, project, mode, &mut report);
        }

        if report.succeeded > 0 {
            profile.touch();
            self.save(&profile)?;
        }
        info!(
            profile = %profile.name,
            succeeded = report.succeeded,
            failed = report.failed,
            "captured tools"
        );
        Ok(report)
    }

    /// Remove the tool at `index` along with its stored content
    pub fn remove_tool(&self, id: Uuid, index: usize) -> Result<ToolRef, ProfileError> {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        let len = profile.tool_refs.len();
        if index >= len {
            return Err(ProfileError::InvalidIndex { index, len });
        }

        let tool = profile.tool_refs.remove(index);
        let files = self.files(id);
        if files.has_tool(tool.tool_type, &tool.name) {
            files.remove_tool(tool.tool_type, &tool.name)?;
        }
        profile.touch();
        self.save(&profile)?;
        Ok(tool)
    }

    /// Add or replace plugin references, keyed by `name@marketplace`
    pub fn add_plugins(&self, id: Uuid, plugins: Vec<ProfilePluginRef>) -> Result<Profile, ProfileError> {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        for plugin in plugins {
            let key = plugin.key();
            match profile.plugin_refs.iter_mut().find(|p| p.key() == key) {
                Some(existing) => *existing = plugin,
                None => profile.plugin_refs.push(plugin),
            }
        }
        profile.touch();
        self.save(&profile)?;
        Ok(profile)
    }

    /// Replace a tool's permissions; empty permissions are stored as none
    pub fn set_tool_permissions(
        &self,
        id: Uuid,
        name: &str,
        permissions: Option<ToolPermissions>,
    ) -> Result<Profile, ProfileError> {
        self.edit_tool(id, name, |tool| {
            tool.permissions = permissions.and_then(ToolPermissions::normalized);
            Ok(())
        })
    }

    pub fn set_tool_source_mode(&self, id: Uuid, name: &str, mode: SourceMode) -> Result<Profile, ProfileError> {
        self.edit_tool(id, name, |tool| {
            let source_ref = tool
                .source_ref
                .as_mut()
                .ok_or_else(|| ProfileError::NoSourceRef(tool.name.clone()))?;
            source_ref.mode = mode;
            Ok(())
        })
    }

    fn edit_tool<F>(&self, id: Uuid, name: &str, edit: F) -> Result<Profile, ProfileError>
    where
        F: FnOnce(&mut ToolRef) -> Result<(), ProfileError>,
    {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        let index = profile
            .tool_index(name)
            .ok_or_else(|| ProfileError::UnknownTool(name.to_string()))?;
        edit(&mut profile.tool_refs[index])?;
        profile.touch();
        self.save(&profile)?;
        Ok(profile)
    }

    /// Delete a profile, unassigning its projects and removing its content
    pub fn delete(&self, id: Uuid) -> Result<(), ProfileError> {
        let _guard = lock_profile(id);
        let profile = self.load(id)?;

        let projects = self.projects();
        for mut project in projects.list_by_profile(id)? {
            project.assign(None);
            projects.update(&project)?;
        }
        self.table().delete(id)?;
        self.files(id).delete_all()?;
        info!(profile = %profile.name, "deleted profile");
        Ok(())
    }

    /// Assign a profile to a project, registering the project if needed
    ///
    /// A project holds at most one profile; a previous assignment is
    /// dropped from the other profile's project list.
    pub fn assign_project(&self, id: Uuid, path: &Path) -> Result<Project, ProfileError> {
        let projects = self.projects();
        let mut project = projects.get_or_create(path)?;
        let previous = project.assigned_profile_id.filter(|p| *p != id);

        let mut keys = vec![LockKey::Profile(id)];
        keys.extend(previous.map(LockKey::Profile));
        let _guard = acquire(keys);

        let mut profile = self.load(id)?;
        if let Some(previous) = previous {
            if let Some(mut other) = self.table().get(previous)? {
                other.assigned_projects.retain(|p| p.path != project.path);
                other.touch();
                self.save(&other)?;
            }
        }

        project.assign(Some(id));
        projects.update(&project)?;
        if !profile.assigned_projects.iter().any(|p| p.path == project.path) {
            profile.assigned_projects.push(ProjectInfo {
                path: project.path.clone(),
                name: project.name.clone(),
            });
            profile.touch();
            self.save(&profile)?;
        }
        info!(profile = %profile.name, project = %project.path.display(), "assigned profile");
        Ok(project)
    }

    /// Clear a project's assignment; returns whether it had one
    pub fn unassign_project(&self, path: &Path) -> Result<bool, ProfileError> {
        let projects = self.projects();
        let Some(mut project) = projects.get_by_path(path)? else {
            return Ok(false);
        };
        let Some(id) = project.assigned_profile_id else {
            return Ok(false);
        };

        let _guard = lock_profile(id);
        if let Some(mut profile) = self.table().get(id)? {
            profile.assigned_projects.retain(|p| p.path != project.path);
            profile.touch();
            self.save(&profile)?;
        }
        project.assign(None);
        projects.update(&project)?;
        Ok(true)
    }

    /// Registered projects, sorted by name
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>, ProfileError> {
        Ok(self.projects().list()?)
    }

    /// Drift report for every tracked tool
    pub fn check_updates(&self, id: Uuid) -> Result<UpdateCheck, ProfileError> {
        let profile = self.get(id)?;
        let _guard = lock_profile(id);
        Ok(check_profile_updates(&profile))
    }

    /// Re-copy a tool's source into the profile
    ///
    /// When the profile already holds the current content nothing is
    /// written and `updated_at` is left alone, so repeated pulls are no-ops.
    pub fn pull_tool_update(&self, id: Uuid, name: &str) -> Result<PullOutcome, ProfileError> {
        let _guard = lock_profile(id);
        let mut profile = self.load(id)?;
        let index = profile
            .tool_index(name)
            .ok_or_else(|| ProfileError::UnknownTool(name.to_string()))?;
        let tool = &profile.tool_refs[index];
        let source_ref = tool
            .source_ref
            .clone()
            .ok_or_else(|| ProfileError::NoSourceRef(tool.name.clone()))?;
        let tool_type = tool.tool_type;
        let tool_name = tool.name.clone();

        let location = location_of(&source_ref);
        let current = source_hash(tool_type, &location)
            .map_err(|e| StorageError::Io(format!("{}: {e}", location.path.display())))?
            .ok_or_else(|| ProfileError::SourceMissing {
                name: tool_name.clone(),
                path: location.path.clone(),
            })?;

        if current == source_ref.source_hash {
            debug!(tool = %tool_name, "already up to date");
            return Ok(PullOutcome {
                changed: false,
                new_hash: current,
            });
        }

        let new_hash = store_from_source(&self.files(id), tool_type, &tool_name, &location)?;
        if let Some(source_ref) = profile.tool_refs[index].source_ref.as_mut() {
            update_source_hash(source_ref, new_hash.clone());
        }
        profile.touch();
        self.save(&profile)?;
        info!(profile = %profile.name, tool = %tool_name, "pulled tool update");
        Ok(PullOutcome {
            changed: true,
            new_hash,
        })
    }
}

fn capture_into(
    profile: &mut Profile,
    files: &ProfileFiles,
    record: &ToolRecord,
    project: Option<&Path>,
    mode: SourceMode,
    report: &mut CaptureReport,
) {
    match capture_record(files, record, project, mode) {
        Ok(tool) => {
            profile.tool_refs.push(tool);
            report.succeeded += 1;
        }
        Err(e) => {
            warn!(name = %record.name, error = %e, "capture failed");
            report.fail(&record.name, record.kind.into(), e.to_string());
        }
    }
}
