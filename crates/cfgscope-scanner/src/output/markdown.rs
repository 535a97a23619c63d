//! Markdown output formatter

use crate::collision::Collision;
use crate::inventory::{Inventory, ScopeContents};

/// Convert inventory to Markdown report
#[must_use]
pub fn to_markdown(inventory: &Inventory) -> String {
    let mut output = String::new();

    output.push_str("# Claude Configuration Inventory\n\n");
    output.push_str(&format!(
        "**Scanned at:** {}\n\n",
        inventory.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str("## Host\n\n");
    output.push_str(&format!("- **OS:** {}\n", inventory.host.os));
    output.push_str(&format!("- **User:** {}\n", inventory.host.username));
    output.push_str(&format!(
        "- **Home:** {}\n\n",
        inventory.host.home_dir.display()
    ));

    output.push_str("## User Scope\n\n");
    push_counts(&mut output, &inventory.user_scope.contents);

    if let Some(managed) = &inventory.managed_scope {
        output.push_str("## Managed Scope\n\n");
        push_counts(&mut output, &managed.contents);
    }

    output.push_str("## Projects\n\n");
    if inventory.projects.is_empty() {
        output.push_str("_No projects scanned_\n\n");
    } else {
        for project in &inventory.projects {
            output.push_str(&format!("### {}\n\n", project.name));
            output.push_str(&format!("- **Path:** {}\n", project.path.display()));
            if let Some(git) = &project.git {
                output.push_str(&format!(
                    "- **Branch:** {}{}\n",
                    git.branch,
                    if git.is_dirty { " (dirty)" } else { "" }
                ));
            }
            if project.claude_md.is_some() {
                output.push_str("- **CLAUDE.md:** yes\n");
            }
            push_counts(&mut output, &project.project);
            if !project.local.is_empty() {
                output.push_str("#### Local overrides\n\n");
                push_counts(&mut output, &project.local);
            }
        }
    }

    if !inventory.failures.is_empty() {
        output.push_str("### Failed projects\n\n");
        for failure in &inventory.failures {
            output.push_str(&format!(
                "- `{}`: {}\n",
                failure.path.display(),
                failure.error
            ));
        }
        output.push('\n');
    }

    output.push_str("## Plugins\n\n");
    if inventory.plugins.installed.is_empty() {
        output.push_str("_No plugins installed_\n\n");
    } else {
        for plugin in &inventory.plugins.installed {
            output.push_str(&format!(
                "- **{}** v{} ({}){}\n",
                plugin.key(),
                plugin.version,
                plugin.install_scope,
                if plugin.enabled { "" } else { " _disabled_" }
            ));
        }
        output.push('\n');
    }

    output.push_str("## Collisions\n\n");
    if inventory.collisions.has_collisions() {
        output.push_str(&format!(
            "**Total:** {} collisions detected\n\n",
            inventory.collisions.total_count()
        ));
        push_collisions(&mut output, "Skill", &inventory.collisions.skills);
        push_collisions(&mut output, "Command", &inventory.collisions.commands);
        push_collisions(&mut output, "Agent", &inventory.collisions.agents);
    } else {
        output.push_str("_No collisions detected_\n\n");
    }

    if !inventory.warnings.is_empty() {
        output.push_str("## Warnings\n\n");
        for warning in &inventory.warnings {
            output.push_str(&format!(
                "- [{}] `{}`: {}\n",
                warning.kind,
                warning.path.display(),
                warning.message
            ));
        }
        output.push('\n');
    }

    output
}

fn push_counts(output: &mut String, contents: &ScopeContents) {
    output.push_str(&format!("- **Skills:** {}\n", contents.skills.len()));
    output.push_str(&format!("- **Commands:** {}\n", contents.commands.len()));
    output.push_str(&format!("- **Agents:** {}\n", contents.agents.len()));
    output.push_str(&format!(
        "- **MCP servers:** {}\n",
        contents.mcp.as_ref().map_or(0, |m| m.servers.len())
    ));
    output.push_str(&format!("- **Hooks:** {}\n\n", contents.hooks.len()));
}

fn push_collisions(output: &mut String, label: &str, collisions: &[Collision]) {
    if collisions.is_empty() {
        return;
    }
    output.push_str(&format!("### {label} Collisions\n\n"));
    for collision in collisions {
        let winner = collision
            .winner_scope
            .as_ref()
            .map_or_else(|| "unresolved".to_string(), ToString::to_string);
        output.push_str(&format!("- **{}** (winner: {winner})\n", collision.name));
        for occurrence in &collision.occurrences {
            output.push_str(&format!(
                "  - {}: `{}`\n",
                occurrence.scope,
                occurrence.path.display()
            ));
        }
    }
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ClaudePaths;
    use crate::scan::Scanner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_report_lists_collisions_and_warnings() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        for root in [home.path().join(".claude"), project.path().join(".claude")] {
            let dir = root.join("skills/deploy");
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("SKILL.md"),
                "---\nname: deploy\ndescription: Ship it\n---\n",
            )
            .unwrap();
        }
        fs::write(project.path().join(".mcp.json"), "{ nope").unwrap();

        let inventory = Scanner::new(ClaudePaths::with_home(home.path()))
            .scan_all(&[project.path().to_path_buf()]);
        let report = to_markdown(&inventory);

        assert!(report.contains("### Skill Collisions"));
        assert!(report.contains("**deploy** (winner: project)"));
        assert!(report.contains("## Warnings"));
        assert!(report.contains(".mcp.json"));
    }
}
