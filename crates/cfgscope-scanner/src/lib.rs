//! cfgscope scanner - Claude configuration discovery
//!
//! Read-only scanning of skills, commands, agents, MCP servers and hooks
//! across user, project, local, managed and plugin scopes, merged into one
//! [`Inventory`] with cross-scope collisions resolved by scope precedence.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::single_match_else,
    clippy::match_same_arms,
    clippy::unnecessary_debug_formatting,
    clippy::ref_option,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::manual_let_else
)]

pub mod artifacts;
pub mod collision;
pub mod error;
pub mod hash;
pub mod inventory;
pub mod output;
pub mod parser;
pub mod paths;
pub mod plugins;
pub mod record;
pub mod resolver;
pub mod scan;
pub mod scope;
pub mod settings;
pub mod types;

pub use collision::{
    collisions_in, detect_collisions, Collision, CollisionOccurrence, CollisionReport,
};
pub use error::{ScanError, ScanResult, ScanWarning, WarningKind};
pub use inventory::{Inventory, ProjectScanFailure};
pub use paths::ClaudePaths;
pub use record::{ToolKind, ToolMetadata, ToolRecord};
pub use resolver::resolve_winner;
pub use scan::Scanner;
pub use scope::{scan_scope, ScopeScan};
pub use types::Scope;
