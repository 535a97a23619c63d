//! Parsers for Claude configuration files

pub mod frontmatter;
pub mod mcp;
pub mod settings;

pub use frontmatter::{parse_agent, parse_command, parse_skill};
pub use mcp::{parse_local_mcp, parse_mcp_config};
pub use settings::{parse_hooks_file, parse_settings};
