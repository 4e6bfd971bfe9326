//! Error types and JSON-RPC error code mapping.

use super::message::{JsonRpcError, RequestId};

/// JSON-RPC and MCP error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// MCP: the requested resource does not exist.
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
}

/// Errors produced by the MCP server.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Malformed JSON on the wire.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Structurally invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown method.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Parameters failed validation.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unexpected server-side failure.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// No resource is registered under the URI.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A request arrived before the initialize handshake completed.
    #[error("Server not yet initialized. Send 'initialize' first.")]
    NotInitialized,

    /// Outbound delivery failed (closed connection, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) | McpError::NotInitialized => {
                error_codes::INVALID_REQUEST
            }
            McpError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            McpError::ResourceNotFound(_) => error_codes::RESOURCE_NOT_FOUND,
            McpError::InternalError(_)
            | McpError::Transport(_)
            | McpError::Config(_)
            | McpError::Io(_)
            | McpError::Json(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Convert into a JSON-RPC error response for the given request.
    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}
