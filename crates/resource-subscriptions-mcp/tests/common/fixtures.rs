//! Test data fixtures for MCP server tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use resource_subscriptions_mcp::config::{ResourceConfig, ServerConfig, TemplateConfig};
use resource_subscriptions_mcp::session::{NotificationSink, SessionHandle, SessionManager};
use resource_subscriptions_mcp::types::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, McpError, McpResult, RequestId,
    ResourceUpdatedParams,
};
use resource_subscriptions_mcp::ProtocolHandler;

/// Sink that records every notification it is given.
#[derive(Clone, Default)]
pub struct Recorder {
    received: Arc<Mutex<Vec<JsonRpcNotification>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn notifications(&self) -> Vec<JsonRpcNotification> {
        self.received.lock().unwrap().clone()
    }

    /// URIs carried by received `notifications/resources/updated`.
    pub fn updated_uris(&self) -> Vec<String> {
        self.notifications()
            .iter()
            .filter_map(ResourceUpdatedParams::from_notification)
            .map(|params| params.uri)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for Recorder {
    async fn send_notification(&self, notification: JsonRpcNotification) -> McpResult<()> {
        self.received.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Sink whose every delivery fails.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn send_notification(&self, _notification: JsonRpcNotification) -> McpResult<()> {
        Err(McpError::Transport("connection reset".to_string()))
    }
}

/// Sink that panics mid-delivery.
pub struct PanickingSink;

#[async_trait]
impl NotificationSink for PanickingSink {
    async fn send_notification(&self, _notification: JsonRpcNotification) -> McpResult<()> {
        panic!("sink exploded");
    }
}

/// Sink that waits before recording.
pub struct SlowSink {
    pub delay: Duration,
    pub recorder: Recorder,
}

#[async_trait]
impl NotificationSink for SlowSink {
    async fn send_notification(&self, notification: JsonRpcNotification) -> McpResult<()> {
        tokio::time::sleep(self.delay).await;
        self.recorder.send_notification(notification).await
    }
}

/// A session handle backed by a fresh recorder.
pub fn recording_session() -> (SessionHandle, Recorder) {
    let recorder = Recorder::new();
    (SessionHandle::new(recorder.clone()), recorder)
}

/// Config mirroring a small server: two fixed resources and one template.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        resources: vec![
            ResourceConfig {
                uri: "resource://test/simple".to_string(),
                name: Some("Simple".to_string()),
                description: None,
                mime_type: None,
                text: "Simple resource content".to_string(),
            },
            ResourceConfig {
                uri: "resource://test/dynamic".to_string(),
                name: Some("Dynamic".to_string()),
                description: Some("Changes at runtime".to_string()),
                mime_type: Some("text/plain".to_string()),
                text: "Value: initial".to_string(),
            },
        ],
        templates: vec![TemplateConfig {
            uri_template: "resource://items/{item_id}".to_string(),
            name: "Item".to_string(),
            description: None,
            mime_type: Some("text/plain".to_string()),
            text: "Item: {item_id}".to_string(),
        }],
        ..ServerConfig::default()
    }
}

/// Shared server state for tests.
pub fn create_test_manager() -> Arc<SessionManager> {
    Arc::new(SessionManager::new(test_config()))
}

pub fn request(id: i64, method: &str, params: serde_json::Value) -> JsonRpcMessage {
    JsonRpcMessage::Request(JsonRpcRequest::new(
        RequestId::Number(id),
        method,
        Some(params),
    ))
}

/// Run the initialize handshake on a handler.
pub async fn init_handler(handler: &ProtocolHandler) {
    let response = handler
        .handle_message(request(
            0,
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "1.0"}
            }),
        ))
        .await
        .expect("initialize must answer");
    assert!(response.get("result").is_some(), "initialize failed: {response}");

    handler
        .handle_message(JsonRpcMessage::Notification(JsonRpcNotification::new(
            "notifications/initialized",
            None,
        )))
        .await;
}

/// Wait until `check` holds, polling briefly.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
