//! settings.json parser, including embedded hook definitions

use crate::artifacts::{HookDefinition, HookInfo, HookSource, HookTrigger};
use crate::error::{ScanError, ScanResult};
use crate::hash::sha256_hex;
use crate::settings::{Permissions, SettingsFile};
use crate::types::Scope;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    env: BTreeMap<String, String>,
    permissions: Option<RawPermissions>,
    #[serde(default)]
    hooks: BTreeMap<String, serde_json::Value>,
    model: Option<String>,
    #[serde(default)]
    enabled_plugins: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPermissions {
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    deny: Vec<String>,
    default_mode: Option<String>,
}

/// One `{ "matcher": ..., "hooks": [...] }` group under a trigger
#[derive(Debug, Deserialize)]
struct RawHookGroup {
    #[serde(default)]
    matcher: Option<String>,
    #[serde(default)]
    hooks: Vec<serde_json::Value>,
}

/// Parse a settings file belonging to `scope`
pub fn parse_settings(path: &Path, content: &str, scope: &Scope) -> ScanResult<SettingsFile> {
    let raw: RawSettings = serde_json::from_str(content).map_err(ScanError::JsonParse)?;

    let source = HookSource::Settings {
        path: path.to_path_buf(),
    };
    let hooks = extract_hooks(&raw.hooks, &source, scope);

    let permissions = raw.permissions.map(|p| Permissions {
        allow: p.allow,
        deny: p.deny,
        default_mode: p.default_mode,
    });

    Ok(SettingsFile {
        path: path.to_path_buf(),
        sha256: sha256_hex(content.as_bytes()),
        hooks,
        permissions,
        enabled_plugins: raw.enabled_plugins,
        env: raw.env,
        model: raw.model,
    })
}

/// Parse a plugin `hooks/hooks.json`, which wraps the same map in `{"hooks": ...}`
pub fn parse_hooks_file(path: &Path, content: &str, plugin_id: &str) -> ScanResult<Vec<HookInfo>> {
    #[derive(Deserialize)]
    struct HooksFile {
        #[serde(default)]
        hooks: BTreeMap<String, serde_json::Value>,
    }

    let file: HooksFile = serde_json::from_str(content)?;
    let source = HookSource::Plugin {
        plugin_id: plugin_id.to_string(),
        path: path.to_path_buf(),
    };
    Ok(extract_hooks(
        &file.hooks,
        &source,
        &Scope::Plugin(plugin_id.to_string()),
    ))
}

/// Flatten the trigger -> groups -> handlers map into individual hooks
///
/// Unknown triggers and handler types are skipped so that newer settings
/// files still scan.
fn extract_hooks(
    raw: &BTreeMap<String, serde_json::Value>,
    source: &HookSource,
    scope: &Scope,
) -> Vec<HookInfo> {
    let mut hooks = Vec::new();
    for (event, groups) in raw {
        let Ok(trigger) = event.parse::<HookTrigger>() else {
            tracing::debug!(event = %event, "skipping unknown hook trigger");
            continue;
        };
        let Ok(groups) = serde_json::from_value::<Vec<RawHookGroup>>(groups.clone()) else {
            tracing::debug!(event = %event, "skipping malformed hook group");
            continue;
        };
        for group in groups {
            for handler in group.hooks {
                match serde_json::from_value::<HookDefinition>(handler) {
                    Ok(definition) => hooks.push(HookInfo {
                        source: source.clone(),
                        trigger,
                        matcher: group.matcher.clone(),
                        definition,
                        scope: scope.clone(),
                    }),
                    Err(e) => tracing::debug!(event = %event, error = %e, "skipping hook handler"),
                }
            }
        }
    }
    hooks
}
