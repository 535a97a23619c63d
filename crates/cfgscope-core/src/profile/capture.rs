//! Copying scanned tools into profile storage
//!
//! A captured tool remembers where it came from as a path plus, for entries
//! that live inside a shared JSON file, how to find the entry again: a JSON
//! pointer for MCP servers, a trigger and matcher for hook groups. The same
//! location is re-read by the update tracker and by pulls.

use super::error::ProfileError;
use super::storage::{ProfileFiles, StorageError};
use super::types::{HookSelector, SourceMode, SourceRef, ToolRef, ToolType};
use crate::util::pointer_token;
use cfgscope_scanner::artifacts::HookDefinition;
use cfgscope_scanner::hash::{hash_dir, hash_file, sha256_hex};
use cfgscope_scanner::{ClaudePaths, Scope, ToolMetadata, ToolRecord};
use chrono::Utc;
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where a tool's original content lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: PathBuf,
    /// JSON pointer into `path`
    pub entry: Option<String>,
    /// Hook group inside `path`
    pub hook: Option<HookSelector>,
}

impl SourceLocation {
    fn is_json_entry(&self) -> bool {
        self.entry.is_some() || self.hook.is_some()
    }

    /// The entry this location names inside `doc`
    fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        match (&self.hook, &self.entry) {
            (Some(selector), _) => find_hook_group(doc, selector),
            (None, Some(pointer)) => doc.pointer(pointer),
            (None, None) => None,
        }
    }
}

/// Find the source of a scanned record
///
/// `project` is needed for local MCP servers, which are keyed by project
/// path inside `~/.claude.json`.
pub fn locate(record: &ToolRecord, project: Option<&Path>) -> Result<SourceLocation, ProfileError> {
    let failure = |message: String| ProfileError::Capture {
        name: record.name.clone(),
        message,
    };

    let mut location = SourceLocation {
        path: record.path.clone(),
        entry: None,
        hook: None,
    };
    match &record.metadata {
        ToolMetadata::Mcp { .. } => {
            location.entry = Some(mcp_pointer(record, project).map_err(failure)?);
        }
        ToolMetadata::Hook {
            trigger,
            matcher,
            definition,
        } => {
            let selector = HookSelector {
                trigger: trigger.as_str().to_string(),
                matcher: matcher.clone().filter(|m| !m.is_empty()),
                handler: handler_fingerprint(definition),
            };
            let doc = read_json(&record.path).map_err(|e| failure(e.to_string()))?;
            if find_hook_group(&doc, &selector).is_none() {
                return Err(failure(format!(
                    "hook group not found in {}",
                    record.path.display()
                )));
            }
            location.hook = Some(selector);
        }
        _ => {}
    }
    Ok(location)
}

fn mcp_pointer(record: &ToolRecord, project: Option<&Path>) -> Result<String, String> {
    let name = pointer_token(&record.name);
    if record.scope == Scope::Local {
        let project = project.ok_or("local MCP server without a project")?;
        let key = pointer_token(&ClaudePaths::local_mcp_key(project));
        return Ok(format!("/projects/{key}/mcpServers/{name}"));
    }

    let doc = read_json(&record.path).map_err(|e| e.to_string())?;
    let wrapped = format!("/mcpServers/{name}");
    if doc.pointer(&wrapped).is_some() {
        return Ok(wrapped);
    }
    let flat = format!("/{name}");
    if doc.pointer(&flat).is_some() {
        return Ok(flat);
    }
    Err(format!("server not found in {}", record.path.display()))
}

fn handler_fingerprint(definition: &HookDefinition) -> Option<String> {
    serde_json::to_vec(definition).ok().map(|bytes| sha256_hex(&bytes))
}

fn group_matcher(group: &Value) -> Option<&str> {
    group
        .get("matcher")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
}

fn group_holds_handler(group: &Value, fingerprint: &str) -> bool {
    group
        .get("hooks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|handler| serde_json::from_value::<HookDefinition>(handler.clone()).ok())
        .filter_map(|definition| handler_fingerprint(&definition))
        .any(|hash| hash == fingerprint)
}

/// The group for `selector` under its trigger
///
/// A single group with the matcher is taken as is, so edits to its handlers
/// show up as drift. Several groups sharing the matcher are narrowed to the
/// one holding the captured handler; if none does, the group is missing.
fn find_hook_group<'a>(doc: &'a Value, selector: &HookSelector) -> Option<&'a Value> {
    let wanted = selector.matcher.as_deref().filter(|m| !m.is_empty());
    let candidates: Vec<&Value> = doc
        .pointer(&format!("/hooks/{}", pointer_token(&selector.trigger)))?
        .as_array()?
        .iter()
        .filter(|group| group_matcher(group) == wanted)
        .collect();

    if let [only] = candidates.as_slice() {
        return Some(*only);
    }
    let fingerprint = selector.handler.as_deref()?;
    candidates
        .into_iter()
        .find(|group| group_holds_handler(group, fingerprint))
}

fn read_json(path: &Path) -> io::Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Hash of the content at a source location; `None` when it is gone
pub fn source_hash(tool_type: ToolType, location: &SourceLocation) -> io::Result<Option<String>> {
    if !location.path.exists() {
        return Ok(None);
    }
    if location.is_json_entry() {
        let doc = read_json(&location.path)?;
        return location.resolve(&doc).map(hash_value).transpose();
    }
    let hash = match tool_type {
        ToolType::Skill => hash_dir(&location.path)?,
        _ => hash_file(&location.path)?,
    };
    Ok(Some(hash))
}

fn hash_value(value: &Value) -> io::Result<String> {
    let bytes = serde_json::to_vec(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(sha256_hex(&bytes))
}

/// Copy the content at `location` into `files`; returns its hash
///
/// The hash is taken from what was stored, so a later comparison with the
/// source measures drift from the profile's copy.
pub fn store_from_source(
    files: &ProfileFiles,
    tool_type: ToolType,
    name: &str,
    location: &SourceLocation,
) -> Result<String, ProfileError> {
    let missing = || ProfileError::SourceMissing {
        name: name.to_string(),
        path: location.path.clone(),
    };
    if !location.path.exists() {
        return Err(missing());
    }
    let io_err = |e: io::Error| StorageError::Io(format!("{}: {e}", location.path.display()));

    if location.is_json_entry() {
        let doc = read_json(&location.path).map_err(io_err)?;
        let value = location.resolve(&doc).ok_or_else(missing)?;
        let stored = match tool_type {
            ToolType::Hook => {
                let trigger = location
                    .hook
                    .as_ref()
                    .map_or_else(|| name.split(':').next().unwrap_or(name), |h| h.trigger.as_str());
                json!({ "trigger": trigger, "group": value })
            }
            _ => value.clone(),
        };
        files.store_json(tool_type, name, &stored)?;
        return Ok(hash_value(value).map_err(io_err)?);
    }

    let hash = match tool_type {
        ToolType::Skill => {
            let stored = files.store_dir(tool_type, name, &location.path)?;
            hash_dir(&stored).map_err(io_err)?
        }
        _ => {
            let stored = files.store_file(tool_type, name, &location.path)?;
            hash_file(&stored).map_err(io_err)?
        }
    };
    Ok(hash)
}

/// Capture one scanned record into profile storage
pub fn capture_record(
    files: &ProfileFiles,
    record: &ToolRecord,
    project: Option<&Path>,
    mode: SourceMode,
) -> Result<ToolRef, ProfileError> {
    let tool_type = ToolType::from(record.kind);
    let location = locate(record, project)?;
    let source_hash = store_from_source(files, tool_type, &record.name, &location)?;
    tracing::debug!(name = %record.name, %tool_type, scope = %record.scope, "captured tool");

    let mut tool = ToolRef::new(record.name.clone(), tool_type).with_scope(record.scope.clone());
    tool.source_ref = Some(SourceRef {
        source_path: location.path,
        entry: location.entry,
        hook: location.hook,
        source_hash,
        mode,
        copied_at: Utc::now().to_rfc3339(),
    });
    Ok(tool)
}

/// The location recorded in a source ref
pub fn location_of(source_ref: &SourceRef) -> SourceLocation {
    SourceLocation {
        path: source_ref.source_path.clone(),
        entry: source_ref.entry.clone(),
        hook: source_ref.hook.clone(),
    }
}
