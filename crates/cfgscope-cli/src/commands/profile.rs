//! Profile CLI commands
//!
//! Handles: cfgscope profile list/create/show/delete/add-tool/remove-tool/
//! check-updates/pull/install/assign/unassign/add-plugin, and `cfgscope projects`

use super::print_preview;
use crate::Context;
use anyhow::{bail, Result};
use cfgscope_core::install::{assign_profile_as_plugin, install_profile, install_profile_to_user, InstallOutcome};
use cfgscope_core::profile::{
    CaptureReport, ProfilePluginRef, ProfileSource, SourceMode, ToolSource, ToolSpec, ToolType,
};
use cfgscope_core::ProfileStore;
use cfgscope_scanner::Scope;
use clap::Subcommand;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List all profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new profile, capturing tools from projects
    Create {
        /// Profile name
        name: String,
        /// Source project (repeatable; defaults to current directory)
        #[arg(short, long = "source", value_name = "PROJECT")]
        sources: Vec<PathBuf>,
        /// Capture every project found below this folder
        #[arg(long, conflicts_with = "sources")]
        folder: Option<PathBuf>,
        /// Start with no tools
        #[arg(long, conflicts_with_all = ["sources", "folder"])]
        empty: bool,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show profile details
    Show {
        /// Profile name or ID
        profile: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a profile
    Delete {
        /// Profile name or ID
        profile: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Capture tools into a profile
    AddTool {
        /// Profile name or ID
        profile: String,
        /// Tool names
        #[arg(required = true)]
        names: Vec<String>,
        /// Tool type (skill, command, agent, mcp, hook)
        #[arg(long = "type", value_name = "TYPE")]
        tool_type: ToolType,
        /// Project to capture from (defaults to current directory)
        #[arg(long, conflicts_with = "user")]
        from: Option<PathBuf>,
        /// Capture from user scope
        #[arg(long)]
        user: bool,
        /// Freeze the copy instead of tracking the source
        #[arg(long)]
        pin: bool,
    },
    /// Remove a tool from a profile
    RemoveTool {
        /// Profile name or ID
        profile: String,
        /// Tool name
        name: String,
    },
    /// List tracked tools whose source changed
    CheckUpdates {
        /// Profile name or ID
        profile: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy a tool's current source into the profile
    Pull {
        /// Profile name or ID
        profile: String,
        /// Tool name
        tool: String,
    },
    /// Install a profile into a project, or as a user plugin
    Install {
        /// Profile name or ID
        profile: String,
        /// Target project (defaults to current directory)
        #[arg(long, conflicts_with = "user")]
        target: Option<PathBuf>,
        /// Install as a plugin for every project
        #[arg(long)]
        user: bool,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
    /// Assign a profile to a project
    Assign {
        /// Profile name or ID
        profile: String,
        /// Project path
        project: PathBuf,
        /// Also install the profile as a plugin of the project
        #[arg(long)]
        as_plugin: bool,
        /// Preview the plugin install without applying
        #[arg(long, requires = "as_plugin")]
        dry_run: bool,
    },
    /// Clear a project's profile assignment
    Unassign {
        /// Project path
        project: PathBuf,
    },
    /// Reference installed plugins from a profile
    AddPlugin {
        /// Profile name or ID
        profile: String,
        /// Plugin keys (`name@marketplace`)
        #[arg(required = true)]
        plugins: Vec<String>,
        /// Record the plugins as disabled
        #[arg(long)]
        disabled: bool,
    },
}

fn print_report(report: &CaptureReport) {
    println!("Captured {} tools ({} failed)", report.succeeded, report.failed);
    for failure in &report.errors {
        println!("  [FAIL] {} {}: {}", failure.tool_type, failure.name, failure.message);
    }
    for project in &report.skipped_projects {
        println!("  [SKIP] {}", project.display());
    }
}

fn print_outcome(outcome: &InstallOutcome, dry_run: bool) {
    print_preview(&outcome.preview, dry_run);
    println!("Plugin: {} v{}", outcome.plugin_key, outcome.version);
    println!("Location: {}", outcome.install_path.display());
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub fn execute(ctx: &Context, action: ProfileCommands) -> Result<()> {
    let store = ProfileStore::open(ctx.data.clone())?;

    match action {
        ProfileCommands::List { json } => {
            let profiles = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else if profiles.is_empty() {
                println!("No profiles found.");
            } else {
                println!("Profiles:");
                for p in profiles {
                    let desc = p.description.as_deref().unwrap_or("No description");
                    println!(
                        "  {} - {} ({desc}) [{} tools, {} projects]",
                        p.id, p.name, p.tool_count, p.project_count
                    );
                }
            }
        }
        ProfileCommands::Create {
            name,
            sources,
            folder,
            empty,
            description,
        } => {
            let source = if empty {
                ProfileSource::Empty
            } else if let Some(folder) = folder {
                ProfileSource::Folder(folder)
            } else if sources.len() > 1 {
                ProfileSource::Projects(sources)
            } else {
                match sources.into_iter().next() {
                    Some(path) => ProfileSource::Project(path),
                    None => ProfileSource::Project(std::env::current_dir()?),
                }
            };

            let (profile, report) = store.create(&name, source, description)?;
            println!("Created profile '{}': {}", profile.name, profile.id);
            print_report(&report);
        }
        ProfileCommands::Show { profile, json } => {
            let profile = store.find(&profile)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
                return Ok(());
            }

            println!("Profile: {}", profile.name);
            println!("ID: {}", profile.id);
            if let Some(desc) = &profile.description {
                println!("Description: {desc}");
            }
            println!("Created: {}", profile.created_at);
            println!("Updated: {}", profile.updated_at);
            println!("CLAUDE.md: {}", profile.has_claude_md);

            println!("\nTools ({}):", profile.tool_refs.len());
            for tool in &profile.tool_refs {
                let scope = tool
                    .source_scope
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string);
                let mode = tool
                    .source_ref
                    .as_ref()
                    .map_or("untracked", |s| match s.mode {
                        SourceMode::Pin => "pinned",
                        SourceMode::Track => "tracked",
                    });
                println!("  {:<8} {} [{scope}, {mode}]", tool.tool_type.to_string(), tool.name);
            }

            if !profile.plugin_refs.is_empty() {
                println!("\nPlugins:");
                for plugin in &profile.plugin_refs {
                    println!("  {}", plugin.key());
                }
            }
            if !profile.assigned_projects.is_empty() {
                println!("\nAssigned projects:");
                for project in &profile.assigned_projects {
                    println!("  {} ({})", project.name, project.path.display());
                }
            }
        }
        ProfileCommands::Delete { profile, force } => {
            let profile = store.find(&profile)?;
            if !force && !confirm(&format!("Delete profile '{}' (ID: {})?", profile.name, profile.id))? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete(profile.id)?;
            println!("Deleted profile: {}", profile.name);
        }
        ProfileCommands::AddTool {
            profile,
            names,
            tool_type,
            from,
            user,
            pin,
        } => {
            let profile = store.find(&profile)?;
            let source = if user {
                ToolSource::User
            } else {
                ToolSource::Project(match from {
                    Some(path) => path,
                    None => std::env::current_dir()?,
                })
            };
            let specs: Vec<ToolSpec> = names.iter().map(|n| ToolSpec::new(n.clone(), tool_type)).collect();
            let mode = if pin { SourceMode::Pin } else { SourceMode::Track };

            let report = store.add_tools_from_source(profile.id, &source, &specs, mode)?;
            print_report(&report);
            if report.succeeded == 0 {
                bail!("no tools were added to '{}'", profile.name);
            }
        }
        ProfileCommands::RemoveTool { profile, name } => {
            let profile = store.find(&profile)?;
            let Some(index) = profile.tool_index(&name) else {
                bail!("Profile '{}' has no tool named '{name}'", profile.name);
            };
            let removed = store.remove_tool(profile.id, index)?;
            println!("Removed {} '{}' from '{}'", removed.tool_type, removed.name, profile.name);
        }
        ProfileCommands::CheckUpdates { profile, json } => {
            let profile = store.find(&profile)?;
            let check = store.check_updates(profile.id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&check)?);
                return Ok(());
            }

            println!("Checked {} tracked tools", check.total_checked);
            if !check.has_updates() && check.missing_sources.is_empty() {
                println!("Everything is up to date.");
            }
            for update in &check.updates {
                println!(
                    "  [UPDATE] {} {} ({})",
                    update.tool_type,
                    update.name,
                    update.source_path.display()
                );
            }
            for name in &check.missing_sources {
                println!("  [MISSING] {name}");
            }
        }
        ProfileCommands::Pull { profile, tool } => {
            let profile = store.find(&profile)?;
            let outcome = store.pull_tool_update(profile.id, &tool)?;
            if outcome.changed {
                println!("Updated '{tool}' in '{}'", profile.name);
            } else {
                println!("'{tool}' is already up to date.");
            }
        }
        ProfileCommands::Install {
            profile,
            target,
            user,
            dry_run,
        } => {
            let profile = store.find(&profile)?;
            if user {
                let outcome = install_profile_to_user(&store, profile.id, dry_run)?;
                print_outcome(&outcome, dry_run);
            } else {
                let target = match target {
                    Some(path) => path,
                    None => std::env::current_dir()?,
                };
                if !target.is_dir() {
                    bail!("Target path does not exist: {}", target.display());
                }
                let preview = install_profile(&store, profile.id, &target, dry_run)?;
                print_preview(&preview, dry_run);
            }
        }
        ProfileCommands::Assign {
            profile,
            project,
            as_plugin,
            dry_run,
        } => {
            let profile = store.find(&profile)?;
            if !project.is_dir() {
                bail!("Project path does not exist: {}", project.display());
            }
            if as_plugin {
                let registered = store.projects().get_or_create(&project)?;
                let outcome = assign_profile_as_plugin(&store, registered.id, profile.id, dry_run)?;
                print_outcome(&outcome, dry_run);
                if dry_run {
                    return Ok(());
                }
            } else {
                store.assign_project(profile.id, &project)?;
            }
            println!("Assigned '{}' to {}", profile.name, project.display());
        }
        ProfileCommands::Unassign { project } => {
            if store.unassign_project(&project)? {
                println!("Unassigned {}", project.display());
            } else {
                println!("{} has no assigned profile.", project.display());
            }
        }
        ProfileCommands::AddPlugin {
            profile,
            plugins,
            disabled,
        } => {
            let profile = store.find(&profile)?;
            let refs: Vec<ProfilePluginRef> = plugins
                .iter()
                .map(|key| {
                    let (id, marketplace) = match key.split_once('@') {
                        Some((id, marketplace)) => (id, Some(marketplace.to_string())),
                        None => (key.as_str(), None),
                    };
                    ProfilePluginRef {
                        id: id.to_string(),
                        marketplace,
                        scope: Scope::User,
                        enabled: !disabled,
                    }
                })
                .collect();
            let updated = store.add_plugins(profile.id, refs)?;
            println!("'{}' now references {} plugins", updated.name, updated.plugin_refs.len());
        }
    }

    Ok(())
}

/// List registered projects and their assigned profiles
pub fn list_projects(ctx: &Context, json: bool) -> Result<()> {
    let store = ProfileStore::open(ctx.data.clone())?;
    let projects = store.list_projects()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }
    if projects.is_empty() {
        println!("No projects registered.");
        return Ok(());
    }
    for project in projects {
        let profile = match project.assigned_profile_id {
            Some(id) => store.get(id).map_or_else(|_| id.to_string(), |p| p.name),
            None => "-".to_string(),
        };
        println!("{}\t{}\t{profile}", project.name, project.path.display());
    }
    Ok(())
}
