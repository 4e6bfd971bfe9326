//! Per-connection JSON-RPC dispatch.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::session::{SessionHandle, SessionManager};
use crate::types::{
    methods, EmptyResult, InitializeParams, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ListParams, McpError, McpResult, RequestId, ResourceListResult,
    ResourceReadParams, ResourceSubscribeParams, ResourceTemplateListResult,
    ResourceUnsubscribeParams,
};

use super::negotiation::NegotiatedCapabilities;
use super::validator;

/// Handles the messages of one client session.
pub struct ProtocolHandler {
    manager: Arc<SessionManager>,
    session: SessionHandle,
    negotiated: Mutex<NegotiatedCapabilities>,
}

impl ProtocolHandler {
    /// Create a handler for `session`.
    pub fn new(manager: Arc<SessionManager>, session: SessionHandle) -> Self {
        Self {
            manager,
            session,
            negotiated: Mutex::new(NegotiatedCapabilities::default()),
        }
    }

    /// The session this handler serves.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The shared server state.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Parse and handle one wire frame. Unparseable input yields a parse error response.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        match JsonRpcMessage::parse(line) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => {
                tracing::warn!("Dropping malformed message: {e}");
                error_value(RequestId::Null, &e)
            }
        }
    }

    /// Handle a message. Returns the response to send, if any.
    pub async fn handle_message(&self, message: JsonRpcMessage) -> Option<Value> {
        match message {
            JsonRpcMessage::Request(request) => Some(self.handle_request(request).await),
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await;
                None
            }
            JsonRpcMessage::Response(response) => {
                tracing::debug!("Ignoring client response for request {}", response.id);
                None
            }
            JsonRpcMessage::Error(error) => {
                tracing::debug!(
                    "Ignoring client error for request {}: {}",
                    error.id,
                    error.error.message
                );
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        let id = request.id.clone();
        let result = match validator::validate_request(&request) {
            Ok(()) => self.dispatch(&request.method, request.params).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => serde_json::to_value(JsonRpcResponse::new(id.clone(), result))
                .unwrap_or_else(|e| {
                    error_value(id, &McpError::InternalError(e.to_string())).unwrap_or_default()
                }),
            Err(e) => {
                tracing::debug!("Request {id} ({}) failed: {e}", request.method);
                error_value(id, &e).unwrap_or_default()
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        match method {
            methods::INITIALIZE => {
                let params: InitializeParams = validator::parse_params(params)?;
                let result = self.negotiated.lock().await.negotiate(params)?;
                Ok(serde_json::to_value(result)?)
            }
            methods::PING => Ok(serde_json::to_value(EmptyResult::default())?),
            methods::RESOURCES_LIST => {
                self.ensure_initialized().await?;
                let _page: ListParams = validator::parse_optional_params(params)?;
                let result = ResourceListResult {
                    resources: self.manager.resources().list_resources().await,
                    next_cursor: None,
                };
                Ok(serde_json::to_value(result)?)
            }
            methods::RESOURCES_TEMPLATES_LIST => {
                self.ensure_initialized().await?;
                let _page: ListParams = validator::parse_optional_params(params)?;
                let result = ResourceTemplateListResult {
                    resource_templates: self.manager.resources().list_templates(),
                    next_cursor: None,
                };
                Ok(serde_json::to_value(result)?)
            }
            methods::RESOURCES_READ => {
                self.ensure_initialized().await?;
                let params: ResourceReadParams = validator::parse_params(params)?;
                validator::validate_uri(&params.uri)?;
                let result = self.manager.resources().read(&params.uri).await?;
                Ok(serde_json::to_value(result)?)
            }
            methods::RESOURCES_SUBSCRIBE => {
                self.ensure_initialized().await?;
                let params: ResourceSubscribeParams = validator::parse_params(params)?;
                validator::validate_uri(&params.uri)?;
                self.manager
                    .subscriptions()
                    .subscribe(params.uri, &self.session)
                    .await;
                Ok(serde_json::to_value(EmptyResult::default())?)
            }
            methods::RESOURCES_UNSUBSCRIBE => {
                self.ensure_initialized().await?;
                let params: ResourceUnsubscribeParams = validator::parse_params(params)?;
                validator::validate_uri(&params.uri)?;
                self.manager
                    .subscriptions()
                    .unsubscribe(params.uri, &self.session)
                    .await;
                Ok(serde_json::to_value(EmptyResult::default())?)
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            methods::INITIALIZED | methods::INITIALIZED_LEGACY => {
                if let Err(e) = self.negotiated.lock().await.mark_initialized() {
                    tracing::warn!("Session {}: {e}", self.session.id());
                }
            }
            methods::CANCELLED => {
                tracing::debug!("Session {} cancelled a request", self.session.id());
            }
            other => {
                tracing::debug!("Ignoring notification: {other}");
            }
        }
    }

    async fn ensure_initialized(&self) -> McpResult<()> {
        self.negotiated.lock().await.ensure_initialized()
    }
}

fn error_value(id: RequestId, error: &McpError) -> Option<Value> {
    serde_json::to_value(error.to_json_rpc_error(id)).ok()
}
