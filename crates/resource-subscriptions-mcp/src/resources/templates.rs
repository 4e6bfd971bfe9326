//! Resource URI templates with simple `{name}` expressions.

use std::collections::HashMap;

use crate::config::TemplateConfig;
use crate::subscriptions::ResourceUri;
use crate::types::ResourceTemplateDefinition;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Variable(String),
}

/// A parameterised resource, e.g. `resource://items/{item_id}`.
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    config: TemplateConfig,
    parts: Vec<Part>,
}

impl ResourceTemplate {
    /// Compile a template from its config entry.
    pub fn new(config: TemplateConfig) -> Self {
        let parts = parse(&config.uri_template);
        Self { config, parts }
    }

    /// The raw URI template.
    pub fn uri_template(&self) -> &str {
        &self.config.uri_template
    }

    /// The MIME type of expanded resources.
    pub fn mime_type(&self) -> Option<&str> {
        self.config.mime_type.as_deref()
    }

    /// Match a concrete URI, returning the bound variables.
    ///
    /// A variable matches one or more characters up to the next literal and
    /// never spans a `/`.
    pub fn match_uri(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut rest = uri;
        let mut params = HashMap::new();

        for (i, part) in self.parts.iter().enumerate() {
            match part {
                Part::Literal(literal) => {
                    rest = rest.strip_prefix(literal.as_str())?;
                }
                Part::Variable(name) => {
                    let end = match self.parts.get(i + 1) {
                        Some(Part::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(params)
    }

    /// Expand the content template with bound variables.
    pub fn render(&self, params: &HashMap<String, String>) -> String {
        params
            .iter()
            .fold(self.config.text.clone(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    /// Definition for resources/templates/list.
    pub fn definition(&self) -> ResourceTemplateDefinition {
        ResourceTemplateDefinition {
            uri_template: self.config.uri_template.clone(),
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            mime_type: self.config.mime_type.clone(),
        }
    }
}

fn parse(template: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    // Concrete URIs arrive canonicalised, so a literal scheme must be too.
    let canonical = match template.split_once("://") {
        Some((scheme, _)) if !scheme.contains('{') => ResourceUri::new(template).into_string(),
        _ => template.to_string(),
    };
    let mut rest = canonical.as_str();

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|c| open + c) else {
            break;
        };
        if open > 0 {
            parts.push(Part::Literal(rest[..open].to_string()));
        }
        parts.push(Part::Variable(rest[open + 1..close].to_string()));
        rest = &rest[close + 1..];
    }

    if !rest.is_empty() {
        parts.push(Part::Literal(rest.to_string()));
    }
    parts
}
