//! Stdio transport — newline-delimited JSON-RPC over stdin/stdout, one session.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::protocol::ProtocolHandler;
use crate::session::SessionManager;
use crate::types::{JsonRpcNotification, McpResult};

/// Serves a single MCP session over a pair of byte streams.
pub struct StdioTransport {
    manager: Arc<SessionManager>,
}

impl StdioTransport {
    /// Create a transport sharing `manager`.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Serve over the process's stdin and stdout until stdin closes.
    pub async fn run(&self) -> McpResult<()> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve over arbitrary streams. The session's subscriptions are removed
    /// when the input ends or an I/O error occurs.
    pub async fn run_with<R, W>(&self, reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (guard, mut notifications) = self.manager.connect_channel();
        let handler = ProtocolHandler::new(self.manager.clone(), guard.handle().clone());

        let result = serve(&handler, reader, &mut writer, &mut notifications).await;
        guard.close().await;

        if let Err(e) = &result {
            tracing::error!("Stdio session ended with error: {e}");
        }
        result
    }
}

async fn serve<R, W>(
    handler: &ProtocolHandler,
    reader: R,
    writer: &mut W,
    notifications: &mut mpsc::Receiver<JsonRpcNotification>,
) -> McpResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("Input closed, shutting down session");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(response) = handler.handle_line(&line).await {
                    write_frame(writer, &response).await?;
                }
            }
            Some(notification) = notifications.recv() => {
                write_frame(writer, &serde_json::to_value(&notification)?).await?;
            }
        }
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Value) -> McpResult<()> {
    let mut bytes = serde_json::to_vec(frame)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
