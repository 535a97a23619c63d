//! cfgscope CLI - Command-line interface for cfgscope
//!
//! Provides `cfgscope scan`, `cfgscope profile`, `cfgscope mcp`, and other
//! commands.

mod commands;

use anyhow::{Context as _, Result};
use cfgscope_scanner::ClaudePaths;
use cfgscope_core::DataPaths;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::mcp::McpCommands;
use commands::profile::ProfileCommands;
use commands::scan::OutputFormat;
use commands::skill::SkillCommands;
use commands::tool::ToolCommands;

#[derive(Parser)]
#[command(name = "cfgscope")]
#[command(about = "cfgscope - Claude configuration inventory and profile manager")]
#[command(version)]
struct Cli {
    /// Home directory to read Claude configuration from
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Directory holding the profile database and stored profiles
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan Claude configuration across scopes
    Scan {
        /// Project directories to scan (in addition to user scope)
        #[arg(value_name = "PROJECT")]
        projects: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include managed scope
        #[arg(long)]
        managed: bool,
    },
    /// Find projects with Claude configuration below a folder
    Discover {
        folder: PathBuf,

        /// Directory levels to search
        #[arg(long, default_value_t = cfgscope_core::profile::discovery::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// List registered projects
    Projects {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// Manage MCP servers
    Mcp {
        #[command(subcommand)]
        action: McpCommands,
        /// Project directory (defaults to current directory)
        #[arg(short, long, global = true)]
        project: Option<PathBuf>,
    },
    /// Create and manage skills
    Skill {
        #[command(subcommand)]
        action: SkillCommands,
        /// Project directory (defaults to current directory)
        #[arg(short, long, global = true)]
        project: Option<PathBuf>,
    },
    /// Add or remove commands and agents
    Tool {
        #[command(subcommand)]
        action: ToolCommands,
        /// Project directory (defaults to current directory)
        #[arg(short, long, global = true)]
        project: Option<PathBuf>,
    },
}

/// Paths resolved from flags and environment
pub struct Context {
    pub data: DataPaths,
}

impl Context {
    fn resolve(home: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let data = match (home, data_dir) {
            (None, None) => DataPaths::from_env().context("cannot locate home directory")?,
            (home, data_dir) => {
                let claude = match home {
                    Some(home) => ClaudePaths::with_home(home),
                    None => ClaudePaths::from_env().context("cannot locate home directory")?,
                };
                let data_dir = match data_dir {
                    Some(dir) => dir,
                    None => DataPaths::from_env()
                        .map(|p| p.data_dir().to_path_buf())
                        .unwrap_or_else(|_| claude.home().join(".cfgscope")),
                };
                DataPaths::new(data_dir, claude)
            }
        };
        Ok(Self { data })
    }

    pub fn claude(&self) -> &ClaudePaths {
        self.data.claude()
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn project_or_cwd(project: Option<PathBuf>) -> Result<PathBuf> {
    let path = match project {
        Some(path) => path,
        None => std::env::current_dir().context("cannot read current directory")?,
    };
    Ok(ClaudePaths::canonical_project(&path))
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context::resolve(cli.home, cli.data_dir)?;
    tracing::debug!(
        home = %ctx.claude().home().display(),
        data_dir = %ctx.data.data_dir().display(),
        "resolved paths"
    );

    match cli.command {
        Commands::Scan {
            projects,
            format,
            output,
            managed,
        } => commands::scan::run_scan(&ctx, &projects, format, output.as_deref(), managed),
        Commands::Discover { folder, max_depth } => commands::scan::run_discover(&folder, max_depth),
        Commands::Projects { json } => commands::profile::list_projects(&ctx, json),
        Commands::Profile { action } => commands::profile::execute(&ctx, action),
        Commands::Mcp { action, project } => commands::mcp::execute(&ctx, action, project_or_cwd(project)?),
        Commands::Skill { action, project } => commands::skill::execute(&ctx, action, project_or_cwd(project)?),
        Commands::Tool { action, project } => commands::tool::execute(&ctx, action, project_or_cwd(project)?),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
