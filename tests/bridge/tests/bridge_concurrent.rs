//! Concurrent access: many client sessions sharing one server.
//!
//! Tests verify that sessions subscribing, notifying and disconnecting in
//! parallel through the protocol layer never see each other's notifications
//! and never leave subscriptions behind.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Barrier;

use resource_subscriptions_mcp::config::ServerConfig;
use resource_subscriptions_mcp::types::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, McpResult, RequestId,
    ResourceUpdatedParams,
};
use resource_subscriptions_mcp::{NotificationSink, ProtocolHandler, SessionGuard, SessionManager};

// ─── Helpers ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<String>>>);

impl Inbox {
    fn uris(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for Inbox {
    async fn send_notification(&self, notification: JsonRpcNotification) -> McpResult<()> {
        if let Some(params) = ResourceUpdatedParams::from_notification(&notification) {
            self.0.lock().unwrap().push(params.uri);
        }
        Ok(())
    }
}

fn open_session(manager: &Arc<SessionManager>) -> (ProtocolHandler, SessionGuard, Inbox) {
    let inbox = Inbox::default();
    let guard = manager.connect(inbox.clone());
    let handler = ProtocolHandler::new(manager.clone(), guard.handle().clone());
    (handler, guard, inbox)
}

async fn init_handler(handler: &ProtocolHandler) {
    let init_req = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: RequestId::Number(0),
        method: "initialize".to_string(),
        params: Some(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "1.0"}
        })),
    };
    handler
        .handle_message(JsonRpcMessage::Request(init_req))
        .await;

    let init_notif = JsonRpcNotification {
        jsonrpc: "2.0".to_string(),
        method: "notifications/initialized".to_string(),
        params: None,
    };
    handler
        .handle_message(JsonRpcMessage::Notification(init_notif))
        .await;
}

async fn call(handler: &ProtocolHandler, method: &str, uri: &str) -> serde_json::Value {
    let req = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: RequestId::Number(1),
        method: method.to_string(),
        params: Some(json!({"uri": uri})),
    };
    handler
        .handle_message(JsonRpcMessage::Request(req))
        .await
        .unwrap()
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// Every agent subscribes to its own resource plus a shared one.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_receive_only_their_updates() {
    let manager = Arc::new(SessionManager::new(ServerConfig::default()));
    let barrier = Arc::new(Barrier::new(8));
    let mut handles = vec![];

    for agent_num in 0..8u32 {
        let manager = manager.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            let (handler, guard, inbox) = open_session(&manager);
            init_handler(&handler).await;

            let own = format!("agent://{agent_num}/state");
            call(&handler, "resources/subscribe", &own).await;
            call(&handler, "resources/subscribe", "agent://shared").await;

            barrier.wait().await; // Everyone is subscribed

            manager.notify_resource_updated(own.as_str()).await;

            barrier.wait().await; // Everyone has notified

            (guard, inbox, own)
        }));
    }

    let mut sessions = vec![];
    for handle in handles {
        sessions.push(handle.await.unwrap());
    }

    manager.notify_resource_updated("agent://shared").await;

    for (_, inbox, own) in &sessions {
        assert_eq!(inbox.uris(), vec![own.clone(), "agent://shared".to_string()]);
    }
    assert_eq!(manager.subscriptions().subscription_count().await, 16);

    for (guard, _, _) in sessions {
        guard.close().await;
    }
    assert_eq!(manager.subscriptions().subscription_count().await, 0);
    assert_eq!(manager.active_sessions(), 0);
}

/// A notification issued after subscribe returns always arrives.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_subscribe_happens_before_notify() {
    let manager = Arc::new(SessionManager::new(ServerConfig::default()));

    for round in 0..50 {
        let (handler, guard, inbox) = open_session(&manager);
        init_handler(&handler).await;
        let uri = format!("res://round/{round}");

        let subscriber = {
            let uri = uri.clone();
            tokio::spawn(async move {
                call(&handler, "resources/subscribe", &uri).await;
                handler
            })
        };
        let _handler = subscriber.await.unwrap();

        manager.notify_resource_updated(uri.as_str()).await;
        assert_eq!(inbox.uris(), vec![uri]);
        guard.close().await;
    }

    assert_eq!(manager.subscriptions().resource_count().await, 0);
}

/// Sessions disconnecting mid-stream never break delivery to the rest.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disconnects_during_notifications() {
    let manager = Arc::new(SessionManager::new(ServerConfig::default()));
    let stayer_inbox;
    let stayer_guard;
    {
        let (handler, guard, inbox) = open_session(&manager);
        init_handler(&handler).await;
        call(&handler, "resources/subscribe", "res://hot").await;
        stayer_inbox = inbox;
        stayer_guard = guard;
    }

    let mut leavers = vec![];
    for _ in 0..10 {
        let manager = manager.clone();
        leavers.push(tokio::spawn(async move {
            let (handler, guard, _inbox) = open_session(&manager);
            init_handler(&handler).await;
            call(&handler, "resources/subscribe", "res://hot").await;
            tokio::task::yield_now().await;
            guard.close().await;
        }));
    }

    let notifier = {
        let manager = manager.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                manager.notify_resource_updated("res://hot").await;
            }
        })
    };

    for leaver in leavers {
        leaver.await.unwrap();
    }
    notifier.await.unwrap();

    assert_eq!(stayer_inbox.uris().len(), 20);
    assert_eq!(manager.subscriptions().subscriber_count("res://hot").await, 1);
    stayer_guard.close().await;
}
