//! Config operations
//!
//! Surgical add/remove/move/update of MCP servers and file-based tools in
//! the user, project and local scopes. Every operation is planned as a
//! change set, previewed, and committed only when the caller asks; pass
//! `dry_run = true` to stop after the preview.

mod error;
mod local;
mod mcp;
mod mcp_ops;
mod ops;
mod scope;
mod skill;

pub use error::{ConfigError, ConfigResult};
pub use local::LocalToolOps;
pub use mcp::{McpDocument, McpServerConfig, McpServerUpdate, McpSlot};
pub use mcp_ops::{McpOps, McpServerItem};
pub use ops::{OperationResult, OperationType, PlannedOperation};
pub use scope::ConfigScope;
pub use skill::SkillConfig;
