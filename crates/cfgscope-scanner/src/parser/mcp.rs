//! MCP configuration parser

use crate::error::ScanResult;
use crate::hash::sha256_hex;
use crate::paths::ClaudePaths;
use crate::settings::{McpConfig, McpServer, McpTransport};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMcpServer {
    #[serde(rename = "type")]
    transport_type: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    url: Option<String>,
}

impl RawMcpServer {
    fn into_server(self, name: String) -> McpServer {
        let transport = match self.transport_type.as_deref() {
            Some("http") => McpTransport::Http,
            Some("sse") => McpTransport::Sse,
            _ => McpTransport::Stdio,
        };
        McpServer {
            name,
            transport,
            command: self.command,
            args: self.args,
            env: self.env,
            url: self.url,
        }
    }

    fn is_server_like(&self) -> bool {
        self.command.is_some() || self.url.is_some()
    }
}

/// Servers from a JSON object keyed by server name, sorted by name
///
/// Entries that are not server-shaped are ignored; a flat plugin file and
/// `~/.claude.json` both carry unrelated keys next to servers.
fn servers_from_object(map: &serde_json::Map<String, Value>) -> Vec<McpServer> {
    let mut servers: Vec<McpServer> = map
        .iter()
        .filter_map(|(name, value)| {
            serde_json::from_value::<RawMcpServer>(value.clone())
                .ok()
                .filter(RawMcpServer::is_server_like)
                .map(|raw| raw.into_server(name.clone()))
        })
        .collect();
    servers.sort_by(|a, b| a.name.cmp(&b.name));
    servers
}

/// Parse an MCP configuration file
///
/// Supports two formats:
/// 1. Wrapped: `{"mcpServers": {"name": {...}}}` (`.mcp.json`, `~/.claude.json`)
/// 2. Flat plugin format: `{"name": {...}}`
///
/// Malformed JSON is an error; a valid file with no servers is not.
pub fn parse_mcp_config(path: &Path, content: &str) -> ScanResult<McpConfig> {
    let json: Value = serde_json::from_str(content)?;

    let servers = match json.get("mcpServers").and_then(Value::as_object) {
        Some(wrapped) => servers_from_object(wrapped),
        None => json.as_object().map(servers_from_object).unwrap_or_default(),
    };

    Ok(McpConfig {
        path: path.to_path_buf(),
        sha256: sha256_hex(content.as_bytes()),
        servers,
        source_plugin: None,
    })
}

/// Parse the local-scope servers for `project` out of `~/.claude.json`
///
/// They live under `projects.<absolute project path>.mcpServers`.
pub fn parse_local_mcp(path: &Path, content: &str, project: &Path) -> ScanResult<McpConfig> {
    let json: Value = serde_json::from_str(content)?;
    let key = ClaudePaths::local_mcp_key(project);

    let servers = json
        .get("projects")
        .and_then(|p| p.get(&key))
        .and_then(|p| p.get("mcpServers"))
        .and_then(Value::as_object)
        .map(servers_from_object)
        .unwrap_or_default();

    Ok(McpConfig {
        path: path.to_path_buf(),
        sha256: sha256_hex(content.as_bytes()),
        servers,
        source_plugin: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_wrapped_format() {
        let content = r#"{
            "mcpServers": {
                "test-server": {
                    "type": "stdio",
                    "command": "/usr/bin/test",
                    "args": ["--flag"],
                    "env": { "KEY": "value" }
                }
            }
        }"#;

        let config = parse_mcp_config(&PathBuf::from(".mcp.json"), content).unwrap();
        assert_eq!(config.servers.len(), 1);
        let server = &config.servers[0];
        assert_eq!(server.name, "test-server");
        assert_eq!(server.transport, McpTransport::Stdio);
        assert_eq!(server.command, Some("/usr/bin/test".to_string()));
    }

    #[test]
    fn test_parse_plugin_format() {
        let content = r#"{
            "supabase": { "type": "http", "url": "https://mcp.supabase.com/mcp" },
            "asana": { "type": "sse", "url": "https://mcp.asana.com/sse" }
        }"#;

        let config = parse_mcp_config(&PathBuf::from(".mcp.json"), content).unwrap();
        let names: Vec<_> = config.servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["asana", "supabase"]);
        assert_eq!(config.servers[0].transport, McpTransport::Sse);
        assert_eq!(config.servers[1].transport, McpTransport::Http);
    }

    #[test]
    fn test_user_file_noise_is_ignored() {
        let content = r#"{ "numStartups": 4, "projects": {}, "theme": "dark" }"#;
        let config = parse_mcp_config(&PathBuf::from(".claude.json"), content).unwrap();
        assert!(config.servers.is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(parse_mcp_config(&PathBuf::from(".mcp.json"), "{").is_err());
    }

    #[test]
    fn test_parse_local_servers() {
        let content = r#"{
            "mcpServers": { "global": { "command": "g" } },
            "projects": { "/work/app": { "mcpServers": { "db": { "command": "pg-mcp" } } } }
        }"#;
        let config =
            parse_local_mcp(&PathBuf::from(".claude.json"), content, Path::new("/work/app")).unwrap();
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].name, "db");
    }
}
