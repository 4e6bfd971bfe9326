//! MCP resources: an in-memory store plus URI templates.

pub mod registry;
pub mod templates;

pub use registry::ResourceRegistry;
pub use templates::ResourceTemplate;
