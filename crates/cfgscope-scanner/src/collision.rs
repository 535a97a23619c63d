//! Cross-scope collision detection

use crate::inventory::Inventory;
use crate::plugins::InstalledPlugin;
use crate::record::{ToolKind, ToolRecord};
use crate::resolver::{compare_scopes, resolve_winner};
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Collisions per tool kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionReport {
    #[serde(default)]
    pub skills: Vec<Collision>,
    #[serde(default)]
    pub commands: Vec<Collision>,
    #[serde(default)]
    pub agents: Vec<Collision>,
}

/// A name defined in more than one scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collision {
    /// Name as spelled by the highest-precedence definition
    pub name: String,
    /// Winning scope; `None` only if resolution failed
    pub winner_scope: Option<Scope>,
    /// One entry per distinct scope, highest precedence first
    pub occurrences: Vec<CollisionOccurrence>,
}

impl Collision {
    /// The occurrence in the winning scope
    #[must_use]
    pub fn winner(&self) -> Option<&CollisionOccurrence> {
        let winner = self.winner_scope.as_ref()?;
        self.occurrences.iter().find(|o| &o.scope == winner)
    }
}

/// A single occurrence of a colliding name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionOccurrence {
    pub scope: Scope,
    pub path: PathBuf,
}

impl CollisionReport {
    #[must_use]
    pub fn has_collisions(&self) -> bool {
        !self.skills.is_empty() || !self.commands.is_empty() || !self.agents.is_empty()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.skills.len() + self.commands.len() + self.agents.len()
    }

    /// Collisions for one kind; MCP servers and hooks are not tracked
    #[must_use]
    pub fn for_kind(&self, kind: ToolKind) -> &[Collision] {
        match kind {
            ToolKind::Skill => &self.skills,
            ToolKind::Command => &self.commands,
            ToolKind::Agent => &self.agents,
            ToolKind::Mcp | ToolKind::Hook => &[],
        }
    }

    /// Case-insensitive lookup
    #[must_use]
    pub fn find(&self, kind: ToolKind, name: &str) -> Option<&Collision> {
        let wanted = name.to_lowercase();
        self.for_kind(kind)
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
    }
}

/// Build the collision report for an inventory
///
/// Disabled plugins do not shadow anything and are left out.
#[must_use]
pub fn detect_collisions(inventory: &Inventory) -> CollisionReport {
    let disabled: Vec<Scope> = inventory
        .plugins
        .installed
        .iter()
        .filter(|p| !p.enabled)
        .map(InstalledPlugin::scope)
        .collect();
    let records: Vec<ToolRecord> = inventory
        .records()
        .into_iter()
        .filter(|r| !disabled.contains(&r.scope))
        .collect();
    collisions_in(&records)
}

/// Build the collision report for a set of records
///
/// Names compare case-insensitively. Each distinct scope contributes one
/// occurrence (its lexicographically smallest path), so a name repeated
/// inside a single scope is not a collision. Output is sorted by name.
#[must_use]
pub fn collisions_in(records: &[ToolRecord]) -> CollisionReport {
    CollisionReport {
        skills: collisions_for(records, ToolKind::Skill),
        commands: collisions_for(records, ToolKind::Command),
        agents: collisions_for(records, ToolKind::Agent),
    }
}

fn collisions_for(records: &[ToolRecord], kind: ToolKind) -> Vec<Collision> {
    // lowercase name -> scope -> (spelling, path)
    let mut by_name: BTreeMap<String, BTreeMap<Scope, (String, PathBuf)>> = BTreeMap::new();

    for record in records.iter().filter(|r| r.kind == kind) {
        let scopes = by_name.entry(record.name.to_lowercase()).or_default();
        scopes
            .entry(record.scope.clone())
            .and_modify(|(name, path)| {
                if record.path < *path {
                    name.clone_from(&record.name);
                    path.clone_from(&record.path);
                }
            })
            .or_insert_with(|| (record.name.clone(), record.path.clone()));
    }

    by_name
        .into_values()
        .filter(|scopes| scopes.len() > 1)
        .map(|scopes| {
            let mut entries: Vec<(Scope, (String, PathBuf))> = scopes.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_scopes(b, a));

            let name = entries[0].1 .0.clone();
            let occurrences: Vec<CollisionOccurrence> = entries
                .into_iter()
                .map(|(scope, (_, path))| CollisionOccurrence { scope, path })
                .collect();

            let winner_scope = match resolve_winner(&occurrences) {
                Ok(scope) => Some(scope),
                Err(e) => {
                    tracing::error!(name = %name, error = %e, "collision without winner");
                    None
                }
            };

            Collision {
                name,
                winner_scope,
                occurrences,
            }
        })
        .collect()
}
