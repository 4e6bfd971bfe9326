//! Session identity and the outbound notification capability.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::types::{JsonRpcNotification, McpError, McpResult};

/// Identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Mint a fresh id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| McpError::InvalidRequest(format!("Invalid session id {s}: {e}")))
    }
}

/// Delivers server-initiated notifications to one connected client.
///
/// Implementations bound their own latency: the subscription registry never
/// times out a delivery attempt.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send one notification. Errors are reported but never retried.
    async fn send_notification(&self, notification: JsonRpcNotification) -> McpResult<()>;
}

/// Sink that forwards notifications into a bounded channel drained by a transport.
pub struct ChannelSink {
    tx: mpsc::Sender<JsonRpcNotification>,
    timeout: Duration,
}

impl ChannelSink {
    /// Wrap an existing sender.
    pub fn new(tx: mpsc::Sender<JsonRpcNotification>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    /// Create a sink together with the receiving end of its channel.
    pub fn channel(
        capacity: usize,
        timeout: Duration,
    ) -> (Self, mpsc::Receiver<JsonRpcNotification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx, timeout), rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn send_notification(&self, notification: JsonRpcNotification) -> McpResult<()> {
        self.tx
            .send_timeout(notification, self.timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => McpError::Transport(format!(
                    "notification channel full for {}ms",
                    self.timeout.as_millis()
                )),
                SendTimeoutError::Closed(_) => {
                    McpError::Transport("notification channel closed".to_string())
                }
            })
    }
}

/// Cheap, clonable reference to a connected session.
///
/// Equality and hashing use the session id only, so every clone of a handle
/// is the same subscriber.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    sink: Arc<dyn NotificationSink>,
}

impl SessionHandle {
    /// Create a handle with a fresh identity.
    pub fn new(sink: impl NotificationSink + 'static) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    /// Create a handle around a shared sink.
    pub fn from_arc(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            id: SessionId::new(),
            sink,
        }
    }

    /// The session's identity.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Attempt delivery of one notification.
    pub async fn notify(&self, notification: JsonRpcNotification) -> McpResult<()> {
        self.sink.send_notification(notification).await
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionHandle {}

impl Hash for SessionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).finish()
    }
}
