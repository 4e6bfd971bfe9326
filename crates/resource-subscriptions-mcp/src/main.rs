//! Resource Subscriptions MCP Server — entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use resource_subscriptions_mcp::config::{load_config, resolve_config_path};
use resource_subscriptions_mcp::session::SessionManager;
use resource_subscriptions_mcp::transport::StdioTransport;
use resource_subscriptions_mcp::types::InitializeResult;

#[derive(Parser)]
#[command(
    name = "resource-subscriptions-mcp",
    about = "MCP server that notifies subscribed clients when resources change",
    version
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over SSE (HTTP).
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },

    /// Print server capabilities and configured resources as JSON.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(config_path.as_deref())?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let manager = Arc::new(SessionManager::new(config));
            let transport = StdioTransport::new(manager);
            transport.run().await?;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp { addr } => {
            let manager = Arc::new(SessionManager::new(config));
            let transport = resource_subscriptions_mcp::transport::SseTransport::new(manager);
            transport.run(&addr).await?;
        }

        Commands::Info => {
            let capabilities = InitializeResult::default_result();
            let manager = SessionManager::new(config);
            let resources = manager.resources().list_resources().await;
            let templates = manager.resources().list_templates();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "resources": resources.iter().map(|r| &r.uri).collect::<Vec<_>>(),
                "templates": templates.iter().map(|t| &t.uri_template).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
