//! JSON output formatters

use crate::error::ScanResult;
use crate::inventory::Inventory;
use crate::record::{ToolKind, ToolRecord};
use crate::resolver::effective_record;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Convert inventory to JSON string
///
/// # Errors
/// Returns an error if serialization fails
pub fn to_json(inventory: &Inventory) -> ScanResult<String> {
    serde_json::to_string_pretty(inventory).map_err(Into::into)
}

#[derive(Serialize)]
struct RecordRow<'a> {
    #[serde(flatten)]
    record: &'a ToolRecord,
    /// This definition is the one Claude uses for its name
    effective: bool,
}

/// Flat list of the records visible from `project`, each marked with
/// whether it wins for its kind and name
///
/// # Errors
/// Returns an error if serialization fails
pub fn records_to_json(inventory: &Inventory, project: Option<&Path>) -> ScanResult<String> {
    let records = inventory.records_for_project(project);

    let mut by_name: BTreeMap<(ToolKind, String), Vec<&ToolRecord>> = BTreeMap::new();
    for record in &records {
        by_name
            .entry((record.kind, record.name.to_lowercase()))
            .or_default()
            .push(record);
    }
    let winners: Vec<&ToolRecord> = by_name
        .into_values()
        .filter_map(|group| effective_record(group))
        .collect();

    let rows: Vec<RecordRow<'_>> = records
        .iter()
        .map(|record| RecordRow {
            record,
            effective: winners.iter().any(|w| std::ptr::eq(*w, record)),
        })
        .collect();
    serde_json::to_string_pretty(&rows).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ClaudePaths;
    use crate::scan::Scanner;
    use crate::types::Scope;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_records_mark_project_definition_effective() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let project = dir.path().join("app");
        for root in [home.join(".claude"), project.join(".claude")] {
            fs::create_dir_all(root.join("commands")).unwrap();
            fs::write(root.join("commands/ship.md"), "---\ndescription: Ship\n---\nShip.\n").unwrap();
        }

        let inventory = Scanner::new(ClaudePaths::with_home(&home)).scan_all(&[project.clone()]);
        let json = records_to_json(&inventory, Some(&project)).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();

        let ships: Vec<_> = rows.iter().filter(|r| r["name"] == "ship").collect();
        assert_eq!(ships.len(), 2);
        for row in ships {
            let is_project = serde_json::from_value::<Scope>(row["scope"].clone()).unwrap() == Scope::Project;
            assert_eq!(row["effective"].as_bool(), Some(is_project));
        }
    }
}
