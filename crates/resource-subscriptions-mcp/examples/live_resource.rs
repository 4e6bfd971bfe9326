//! Example: Embedding the server and pushing resource updates.
//!
//! Demonstrates how application code drives `notifications/resources/updated`:
//! a client subscribes to a clock resource over an in-memory pipe, and the
//! application rewrites the resource once a second.
//!
//! Usage:
//!   cargo run --example live_resource

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use resource_subscriptions_mcp::config::{ResourceConfig, ServerConfig};
use resource_subscriptions_mcp::{SessionManager, StdioTransport};

const CLOCK_URI: &str = "clock://now";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Live Resource Example ===\n");

    let config = ServerConfig {
        resources: vec![ResourceConfig {
            uri: CLOCK_URI.to_string(),
            name: Some("Clock".to_string()),
            description: Some("Current time, rewritten every second".to_string()),
            mime_type: Some("text/plain".to_string()),
            text: chrono::Utc::now().to_rfc3339(),
        }],
        ..ServerConfig::default()
    };
    let manager = Arc::new(SessionManager::new(config));

    // Server side of the pipe.
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let transport = StdioTransport::new(manager.clone());
    let serving = tokio::spawn(async move { transport.run_with(server_read, server_write).await });

    // Application side: rewrite the clock periodically.
    let ticker = {
        let manager = manager.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                manager
                    .update_resource(CLOCK_URI, chrono::Utc::now().to_rfc3339())
                    .await;
            }
        })
    };

    // Client side.
    let (client_read, mut client_write) = tokio::io::split(client);
    let mut lines = BufReader::new(client_read).lines();

    let messages = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "live-resource-example", "version": "1.0"}
        }}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "resources/subscribe",
               "params": {"uri": CLOCK_URI}}),
    ];
    for message in &messages {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        client_write.write_all(&line).await?;
    }

    let mut updates = 0;
    while let Some(line) = lines.next_line().await? {
        let message: Value = serde_json::from_str(&line)?;
        if message["method"] == "notifications/resources/updated" {
            updates += 1;
            println!("Update #{updates}: {}", message["params"]["uri"]);
            if updates == 3 {
                break;
            }
        } else {
            println!("Response: {message}");
        }
    }

    ticker.abort();
    client_write.shutdown().await?;
    serving.await??;
    println!(
        "\nSession closed; {} subscription(s) remain.",
        manager.subscriptions().subscription_count().await
    );
    Ok(())
}
