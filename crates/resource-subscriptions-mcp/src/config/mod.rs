//! Configuration loading and resolution.

pub mod loader;

pub use loader::{
    load_config, resolve_config_path, ResourceConfig, ServerConfig, TemplateConfig,
    CONFIG_ENV_VAR,
};
