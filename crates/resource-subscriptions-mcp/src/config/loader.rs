//! Server configuration loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{McpError, McpResult};

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV_VAR: &str = "RESOURCE_SUBSCRIPTIONS_CONFIG";

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Capacity of each session's outbound notification channel.
    pub notification_buffer: usize,
    /// How long a delivery waits for channel space before failing.
    pub notification_timeout_ms: u64,
    /// Concrete resources served from memory.
    #[serde(rename = "resource")]
    pub resources: Vec<ResourceConfig>,
    /// Parameterised resources.
    #[serde(rename = "template")]
    pub templates: Vec<TemplateConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            notification_buffer: 64,
            notification_timeout_ms: 5_000,
            resources: Vec::new(),
            templates: Vec::new(),
        }
    }
}

/// A concrete resource declared in config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource URI.
    pub uri: String,
    /// Display name; defaults to the URI.
    #[serde(default)]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Initial text content.
    #[serde(default)]
    pub text: String,
}

/// A resource template declared in config.
///
/// `text` may reference template variables as `{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// URI template, e.g. `resource://items/{item_id}`.
    pub uri_template: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Content template.
    #[serde(default)]
    pub text: String,
}

/// Load configuration from a TOML file. A missing path or file yields defaults.
pub fn load_config(path: Option<&str>) -> McpResult<ServerConfig> {
    let Some(path) = path else {
        return Ok(ServerConfig::default());
    };

    let path = Path::new(path);
    if !path.exists() {
        tracing::warn!(
            "Config file {} not found, using defaults",
            path.display()
        );
        return Ok(ServerConfig::default());
    }

    let raw = std::fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&raw)
        .map_err(|e| McpError::Config(format!("{}: {e}", path.display())))?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the config path: explicit argument first, then the environment.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path.to_string());
    }
    std::env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|path| !path.trim().is_empty())
}
