//! Stress tests: large subscriber sets and heavy churn.
//!
//! Tests verify that fan-out to thousands of sessions completes, that churn
//! leaves no empty entries behind, and that both stay within loose time bounds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use resource_subscriptions_mcp::config::ServerConfig;
use resource_subscriptions_mcp::types::{JsonRpcNotification, McpError, McpResult};
use resource_subscriptions_mcp::{NotificationSink, SessionHandle, SessionManager, SubscriptionRegistry};

// ─── Helpers ───────────────────────────────────────────────────────────────

struct Counter(Arc<AtomicUsize>);

#[async_trait]
impl NotificationSink for Counter {
    async fn send_notification(&self, _notification: JsonRpcNotification) -> McpResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails every other delivery.
struct Flaky {
    calls: AtomicUsize,
    delivered: Arc<AtomicUsize>,
}

#[async_trait]
impl NotificationSink for Flaky {
    async fn send_notification(&self, _notification: JsonRpcNotification) -> McpResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            return Err(McpError::Transport("flaky".to_string()));
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_to_many_subscribers() {
    let registry = SubscriptionRegistry::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let sessions: Vec<SessionHandle> = (0..5_000)
        .map(|_| SessionHandle::new(Counter(delivered.clone())))
        .collect();

    for session in &sessions {
        registry.subscribe("res://popular", session).await;
    }
    assert_eq!(registry.subscriber_count("res://popular").await, 5_000);

    let start = Instant::now();
    registry.notify_updated("res://popular").await;
    let elapsed = start.elapsed();

    assert_eq!(delivered.load(Ordering::SeqCst), 5_000);
    assert!(
        elapsed < Duration::from_secs(10),
        "fan-out took {elapsed:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flaky_subscribers_never_fail_the_notifier() {
    let registry = SubscriptionRegistry::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let sessions: Vec<SessionHandle> = (0..100)
        .map(|_| {
            SessionHandle::new(Flaky {
                calls: AtomicUsize::new(0),
                delivered: delivered.clone(),
            })
        })
        .collect();

    for session in &sessions {
        registry.subscribe("res://flaky", session).await;
    }
    for _ in 0..4 {
        registry.notify_updated("res://flaky").await;
    }

    // Each session fails its 1st and 3rd attempt.
    assert_eq!(delivered.load(Ordering::SeqCst), 200);
    assert_eq!(registry.subscriber_count("res://flaky").await, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_churn_leaves_no_entries() {
    let manager = Arc::new(SessionManager::new(ServerConfig::default()));
    let delivered = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    let start = Instant::now();
    for worker in 0..32 {
        let manager = manager.clone();
        let delivered = delivered.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..25 {
                let guard = manager.connect(Counter(delivered.clone()));
                let registry = manager.subscriptions();
                for i in 0..10 {
                    registry
                        .subscribe(format!("res://{}/{}", worker % 4, i), guard.handle())
                        .await;
                }
                registry
                    .unsubscribe(format!("res://{}/0", worker % 4), guard.handle())
                    .await;
                manager
                    .notify_resource_updated(format!("res://{}/{}", worker % 4, round % 10))
                    .await;
                guard.close().await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    let elapsed = start.elapsed();

    assert_eq!(manager.subscriptions().subscription_count().await, 0);
    assert_eq!(manager.subscriptions().resource_count().await, 0);
    assert_eq!(manager.active_sessions(), 0);
    assert!(delivered.load(Ordering::SeqCst) > 0);
    assert!(elapsed < Duration::from_secs(30), "churn took {elapsed:?}");
}
