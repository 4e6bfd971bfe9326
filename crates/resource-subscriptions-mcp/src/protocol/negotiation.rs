//! MCP capability negotiation during initialization.

use crate::types::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, McpError, McpResult,
    MCP_VERSION, SUPPORTED_VERSIONS,
};

/// Stored client capabilities after negotiation.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    /// The client's declared capabilities.
    pub client: ClientCapabilities,
    /// The client's implementation info, once known.
    pub client_info: Option<Implementation>,
    /// Protocol version agreed with the client.
    pub protocol_version: Option<String>,
    /// Whether the handshake is complete.
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    /// Process an initialize request and return the result.
    pub fn negotiate(&mut self, params: InitializeParams) -> McpResult<InitializeResult> {
        let version = if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version.clone()
        } else {
            tracing::warn!(
                "Client requested protocol version {}, server supports {}. Proceeding with server version.",
                params.protocol_version,
                MCP_VERSION
            );
            MCP_VERSION.to_string()
        };

        tracing::info!(
            "Initialized with client: {} v{}",
            params.client_info.name,
            params.client_info.version
        );

        self.client = params.capabilities;
        self.client_info = Some(params.client_info);
        self.protocol_version = Some(version.clone());

        Ok(InitializeResult::for_version(&version))
    }

    /// Mark the handshake as complete (after receiving the `initialized` notification).
    pub fn mark_initialized(&mut self) -> McpResult<()> {
        if self.protocol_version.is_none() {
            return Err(McpError::InvalidRequest(
                "Received initialized before initialize".to_string(),
            ));
        }
        self.initialized = true;
        tracing::info!("MCP handshake complete");
        Ok(())
    }

    /// Check that the handshake is complete before processing requests.
    pub fn ensure_initialized(&self) -> McpResult<()> {
        if !self.initialized {
            return Err(McpError::NotInitialized);
        }
        Ok(())
    }
}
