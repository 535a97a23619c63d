//! Whether a project's tools still resolve
//!
//! Pure lookups over an [`Inventory`] snapshot. Absence is a normal result,
//! reported with a reason rather than an error.

use super::types::{Profile, ToolRef};
use cfgscope_scanner::{Inventory, Scope};
use serde::Serialize;
use std::path::Path;

/// How a tool is attached to a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOrigin {
    /// Content stored inside the assigned profile
    Profile,
    /// Defined directly in one of the project's scopes
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Availability {
    fn yes() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    fn no(reason: String) -> Self {
        Self {
            available: false,
            reason: Some(reason),
        }
    }
}

/// Resolve one tool against the inventory
///
/// Profile-origin tools carry their own content and are always available.
/// Local tools are looked up case-insensitively among the records visible
/// from `project`, restricted to `source_scope` when it is set.
pub fn check_availability(
    tool: &ToolRef,
    origin: ToolOrigin,
    project: Option<&Path>,
    inventory: &Inventory,
) -> Availability {
    if origin == ToolOrigin::Profile {
        return Availability::yes();
    }

    if matches!(tool.source_scope, Some(Scope::Project | Scope::Local)) && project.is_none() {
        return Availability::no(format!(
            "{} '{}' is project-scoped but no project was given",
            tool.tool_type, tool.name
        ));
    }

    let kind = tool.tool_type.kind();
    let found = inventory
        .records_for_project(project)
        .iter()
        .any(|r| {
            r.kind == kind
                && r.name_matches(&tool.name)
                && tool.source_scope.as_ref().map_or(true, |s| *s == r.scope)
        });

    if found {
        Availability::yes()
    } else {
        let place = tool
            .source_scope
            .as_ref()
            .map_or_else(|| "any scope".to_string(), |s| format!("{s} scope"));
        Availability::no(format!("{} '{}' not found in {place}", tool.tool_type, tool.name))
    }
}

/// One entry in a project's effective tool list
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTool {
    pub tool: ToolRef,
    pub origin: ToolOrigin,
    pub availability: Availability,
}

/// Profile tools followed by the project's own project and local tools
pub fn project_tools(
    project: &Path,
    profile: Option<&Profile>,
    inventory: &Inventory,
) -> Vec<ProjectTool> {
    let mut tools: Vec<ProjectTool> = profile
        .into_iter()
        .flat_map(|p| p.tool_refs.iter())
        .map(|tool| ProjectTool {
            tool: tool.clone(),
            origin: ToolOrigin::Profile,
            availability: check_availability(tool, ToolOrigin::Profile, Some(project), inventory),
        })
        .collect();

    if let Some(scope) = inventory.project(project) {
        for record in scope.records() {
            let tool = ToolRef::new(record.name.clone(), record.kind.into()).with_scope(record.scope.clone());
            let availability = check_availability(&tool, ToolOrigin::Local, Some(project), inventory);
            tools.push(ProjectTool {
                tool,
                origin: ToolOrigin::Local,
                availability,
            });
        }
    }

    tools
}
