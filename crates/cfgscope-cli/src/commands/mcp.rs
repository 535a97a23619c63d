//! MCP server CLI commands
//!
//! Handles: cfgscope mcp list/add/remove/update/move

use super::{parse_scope, print_result};
use crate::Context;
use anyhow::{anyhow, Result};
use cfgscope_scanner::settings::McpTransport;
use cfgscope_core::config::{ConfigScope, McpOps, McpServerConfig, McpServerUpdate};
use clap::{Args, Subcommand};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// MCP server commands
#[derive(Subcommand)]
pub enum McpCommands {
    /// List all MCP servers
    List {
        /// Filter by scope
        #[arg(long)]
        scope: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a new MCP server
    Add(McpAddArgs),
    /// Remove an MCP server
    Remove {
        /// Server name
        name: String,
        /// Scope to remove from (auto-detect if not specified)
        #[arg(long)]
        scope: Option<String>,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an MCP server configuration
    Update(McpUpdateArgs),
    /// Move an MCP server between scopes
    Move {
        /// Server name
        name: String,
        /// Source scope (auto-detect if not specified)
        #[arg(long)]
        from: Option<String>,
        /// Target scope
        #[arg(long)]
        to: String,
        /// Overwrite if exists in target
        #[arg(long)]
        force: bool,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for `cfgscope mcp add`
#[derive(Args)]
pub struct McpAddArgs {
    /// Server name (must be unique in scope)
    pub name: String,

    /// Target scope (user, project, local)
    #[arg(long, default_value = "project")]
    pub scope: String,

    /// Transport type (stdio, http, sse)
    #[arg(long, value_name = "TYPE", default_value = "stdio")]
    pub r#type: String,

    /// Command for stdio transport
    #[arg(long)]
    pub command: Option<String>,

    /// Command arguments (can specify multiple times)
    #[arg(long = "args", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Environment variables (KEY=value, can specify multiple times)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// URL for http/sse transport
    #[arg(long)]
    pub url: Option<String>,

    /// Preview changes without applying
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_env(pairs: &[String]) -> Result<Option<BTreeMap<String, String>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut env = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid env format: {pair} (expected KEY=value)"))?;
        env.insert(key.to_string(), value.to_string());
    }
    Ok(Some(env))
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    (!values.is_empty()).then_some(values)
}

impl McpAddArgs {
    pub fn to_config(&self) -> Result<McpServerConfig> {
        let transport = match self.r#type.as_str() {
            "stdio" => McpTransport::Stdio,
            "http" => McpTransport::Http,
            "sse" => McpTransport::Sse,
            other => return Err(anyhow!("Invalid transport type: {other}")),
        };

        let config = McpServerConfig {
            transport,
            command: self.command.clone(),
            args: self.args.clone(),
            env: parse_env(&self.env)?.unwrap_or_default(),
            url: self.url.clone(),
        };
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}

/// Arguments for `cfgscope mcp update`
#[derive(Args)]
pub struct McpUpdateArgs {
    /// Server name
    pub name: String,

    /// Scope to update in (auto-detect if not specified)
    #[arg(long)]
    pub scope: Option<String>,

    /// New command
    #[arg(long)]
    pub command: Option<String>,

    /// Replace all arguments
    #[arg(long = "args", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Add to existing arguments
    #[arg(long = "add-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub add_args: Vec<String>,

    /// Replace all environment variables
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Add environment variables
    #[arg(long = "add-env", value_name = "KEY=VALUE")]
    pub add_env: Vec<String>,

    /// Remove environment variables
    #[arg(long = "remove-env", value_name = "KEY")]
    pub remove_env: Vec<String>,

    /// New URL
    #[arg(long)]
    pub url: Option<String>,

    /// Preview changes without applying
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl McpUpdateArgs {
    fn to_update(&self) -> Result<McpServerUpdate> {
        Ok(McpServerUpdate {
            command: self.command.clone(),
            args: non_empty(self.args.clone()),
            add_args: non_empty(self.add_args.clone()),
            env: parse_env(&self.env)?,
            add_env: parse_env(&self.add_env)?,
            remove_env: non_empty(self.remove_env.clone()),
            url: self.url.clone(),
        })
    }
}

/// Execute MCP command
pub fn execute(ctx: &Context, cmd: McpCommands, project: PathBuf) -> Result<()> {
    let ops = McpOps::new(ctx.claude().clone(), Some(project));

    match cmd {
        McpCommands::List { scope, json } => execute_list(&ops, parse_scope(scope.as_deref())?, json),
        McpCommands::Add(args) => {
            let config = args.to_config()?;
            let scope: ConfigScope = args.scope.parse()?;
            let result = ops.add(&args.name, scope, config, args.dry_run)?;
            print_result(&result, args.dry_run, args.json)
        }
        McpCommands::Remove {
            name,
            scope,
            dry_run,
            json,
        } => {
            let result = ops.remove(&name, parse_scope(scope.as_deref())?, dry_run)?;
            print_result(&result, dry_run, json)
        }
        McpCommands::Update(args) => {
            let update = args.to_update()?;
            let result = ops.update(&args.name, parse_scope(args.scope.as_deref())?, update, args.dry_run)?;
            print_result(&result, args.dry_run, args.json)
        }
        McpCommands::Move {
            name,
            from,
            to,
            force,
            dry_run,
            json,
        } => {
            let to: ConfigScope = to.parse()?;
            let result = ops.move_server(&name, parse_scope(from.as_deref())?, to, force, dry_run)?;
            print_result(&result, dry_run, json)
        }
    }
}

fn execute_list(ops: &McpOps, scope: Option<ConfigScope>, json_output: bool) -> Result<()> {
    let items = match scope {
        Some(scope) => ops.list_scope(scope)?,
        None => ops.list()?,
    };

    if json_output {
        let servers: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                json!({
                    "name": item.name,
                    "scope": item.scope.to_string(),
                    "path": item.path,
                    "transport": item.config.transport.to_string(),
                    "command": item.config.command,
                    "args": item.config.args,
                    "url": item.config.url,
                    "env": item.config.env,
                })
            })
            .collect();

        let output = json!({
            "count": servers.len(),
            "servers": servers,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No MCP servers found.");
        return Ok(());
    }

    // Group by scope for display, keeping list order
    let mut by_scope: Vec<(String, Vec<_>)> = Vec::new();
    for item in &items {
        let scope = item.scope.to_string();
        match by_scope.iter_mut().find(|(s, _)| *s == scope) {
            Some((_, servers)) => servers.push(item),
            None => by_scope.push((scope, vec![item])),
        }
    }

    for (scope_name, servers) in &by_scope {
        println!("\n[{scope_name}]");
        for server in servers {
            println!("  {} ({}) - {}", server.name, server.config.transport, server.config.display());
        }
    }
    println!();
    Ok(())
}
