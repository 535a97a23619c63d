//! `cfgscope scan` and `cfgscope discover`

use crate::Context;
use anyhow::Result;
use cfgscope_scanner::output::{records_to_json, to_json, to_markdown};
use cfgscope_scanner::Scanner;
use cfgscope_core::profile::discover_projects;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Json,
    Markdown,
    /// Flat records as seen from the first project, winners marked
    Records,
}

pub fn run_scan(
    ctx: &Context,
    projects: &[PathBuf],
    format: OutputFormat,
    output: Option<&Path>,
    include_managed: bool,
) -> Result<()> {
    let scanner = Scanner::new(ctx.claude().clone()).with_managed(include_managed);
    let inventory = scanner.scan_all(projects);

    let report = match format {
        OutputFormat::Json => to_json(&inventory)?,
        OutputFormat::Markdown => to_markdown(&inventory),
        OutputFormat::Records => records_to_json(&inventory, projects.first().map(PathBuf::as_path))?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, &report)?;
            println!("Wrote inventory to: {}", path.display());
        }
        None => print!("{report}"),
    }

    for failure in &inventory.failures {
        eprintln!("Warning: could not scan {}: {}", failure.path.display(), failure.error);
    }
    if inventory.collisions.has_collisions() {
        eprintln!("Collisions detected: {}", inventory.collisions.total_count());
    }
    Ok(())
}

pub fn run_discover(folder: &Path, max_depth: usize) -> Result<()> {
    let projects = discover_projects(folder, max_depth)?;
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    for project in projects {
        println!("{}\t{}", project.name, project.path.display());
    }
    Ok(())
}
