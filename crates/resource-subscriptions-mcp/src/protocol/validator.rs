//! Request validation and parameter parsing.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Check the JSON-RPC envelope of a request.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Unsupported jsonrpc version: {}",
            request.jsonrpc
        )));
    }
    if request.method.is_empty() {
        return Err(McpError::InvalidRequest("Empty method name".to_string()));
    }
    Ok(())
}

/// Parse required params into `T`.
pub fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let params = params.ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Parse optional params into `T`, defaulting when absent.
pub fn parse_optional_params<T: DeserializeOwned + Default>(params: Option<Value>) -> McpResult<T> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(params) => {
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
        }
    }
}

/// Reject blank resource URIs. Anything else is accepted as-is.
pub fn validate_uri(uri: &str) -> McpResult<()> {
    if uri.trim().is_empty() {
        return Err(McpError::InvalidParams("Resource URI must not be empty".to_string()));
    }
    Ok(())
}
