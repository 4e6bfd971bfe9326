//! In-memory resource store backing resources/list and resources/read.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::config::{ResourceConfig, ServerConfig};
use crate::subscriptions::ResourceUri;
use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceAnnotations, ResourceContent,
    ResourceDefinition, ResourceTemplateDefinition,
};

use super::templates::ResourceTemplate;

const DEFAULT_MIME_TYPE: &str = "text/plain";

#[derive(Debug, Clone)]
struct StoredResource {
    name: String,
    description: Option<String>,
    mime_type: Option<String>,
    text: String,
    last_modified: DateTime<Utc>,
}

/// Registry of all available MCP resources.
pub struct ResourceRegistry {
    resources: RwLock<BTreeMap<ResourceUri, StoredResource>>,
    templates: Vec<ResourceTemplate>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(BTreeMap::new()),
            templates: Vec::new(),
        }
    }

    /// Seed resources and templates from configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let now = Utc::now();
        let resources = config
            .resources
            .iter()
            .map(|resource| (ResourceUri::new(&resource.uri), stored(resource, now)))
            .collect();
        let templates = config
            .templates
            .iter()
            .cloned()
            .map(ResourceTemplate::new)
            .collect();

        Self {
            resources: RwLock::new(resources),
            templates,
        }
    }

    /// List all resource URI templates.
    pub fn list_templates(&self) -> Vec<ResourceTemplateDefinition> {
        self.templates.iter().map(ResourceTemplate::definition).collect()
    }

    /// List all concrete resources, ordered by URI.
    pub async fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.resources
            .read()
            .await
            .iter()
            .map(|(uri, resource)| ResourceDefinition {
                uri: uri.to_string(),
                name: resource.name.clone(),
                description: resource.description.clone(),
                mime_type: resource.mime_type.clone(),
                annotations: Some(ResourceAnnotations {
                    last_modified: Some(resource.last_modified.to_rfc3339()),
                }),
            })
            .collect()
    }

    /// Read a resource by URI: concrete resources first, then templates.
    pub async fn read(&self, uri: &str) -> McpResult<ReadResourceResult> {
        let uri = ResourceUri::new(uri);

        if let Some(resource) = self.resources.read().await.get(&uri) {
            return Ok(ReadResourceResult {
                contents: vec![ResourceContent {
                    uri: uri.to_string(),
                    mime_type: resource.mime_type.clone(),
                    text: Some(resource.text.clone()),
                    blob: None,
                }],
            });
        }

        for template in &self.templates {
            if let Some(params) = template.match_uri(uri.as_str()) {
                return Ok(ReadResourceResult {
                    contents: vec![ResourceContent {
                        uri: uri.to_string(),
                        mime_type: template.mime_type().map(str::to_string),
                        text: Some(template.render(&params)),
                        blob: None,
                    }],
                });
            }
        }

        Err(McpError::ResourceNotFound(uri.into_string()))
    }

    /// Replace a resource's text, creating the resource if it does not exist.
    pub async fn set_text(&self, uri: impl Into<ResourceUri>, text: impl Into<String>) {
        let uri = uri.into();
        let text = text.into();
        let now = Utc::now();

        let mut resources = self.resources.write().await;
        match resources.get_mut(&uri) {
            Some(resource) => {
                resource.text = text;
                resource.last_modified = now;
            }
            None => {
                tracing::debug!("Creating resource on first update: {uri}");
                resources.insert(
                    uri.clone(),
                    StoredResource {
                        name: uri.to_string(),
                        description: None,
                        mime_type: Some(DEFAULT_MIME_TYPE.to_string()),
                        text,
                        last_modified: now,
                    },
                );
            }
        }
    }

    /// Number of concrete resources.
    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    /// Whether no concrete resources exist.
    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }
}

fn stored(resource: &ResourceConfig, now: DateTime<Utc>) -> StoredResource {
    StoredResource {
        name: resource.name.clone().unwrap_or_else(|| resource.uri.clone()),
        description: resource.description.clone(),
        mime_type: resource
            .mime_type
            .clone()
            .or_else(|| Some(DEFAULT_MIME_TYPE.to_string())),
        text: resource.text.clone(),
        last_modified: now,
    }
}
