//! Shared server state: subscriptions, resources, and connected sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::resources::ResourceRegistry;
use crate::subscriptions::{ResourceUri, SubscriptionRegistry};
use crate::types::JsonRpcNotification;

use super::guard::SessionGuard;
use super::handle::{ChannelSink, NotificationSink, SessionHandle};

/// Owns everything sessions share. Wrap it in an `Arc` and hand a clone to
/// every transport.
pub struct SessionManager {
    subscriptions: SubscriptionRegistry,
    resources: ResourceRegistry,
    config: ServerConfig,
    active_sessions: AtomicUsize,
}

impl SessionManager {
    /// Build the server state from configuration.
    pub fn new(config: ServerConfig) -> Self {
        let resources = ResourceRegistry::from_config(&config);
        tracing::info!(
            "Serving {} resource(s) and {} template(s)",
            config.resources.len(),
            config.templates.len()
        );

        Self {
            subscriptions: SubscriptionRegistry::new(),
            resources,
            config,
            active_sessions: AtomicUsize::new(0),
        }
    }

    /// The subscription registry.
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// The resource store.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of sessions connected and not yet cleaned up.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Register a new connection delivering notifications through `sink`.
    pub fn connect(self: &Arc<Self>, sink: impl NotificationSink + 'static) -> SessionGuard {
        let handle = SessionHandle::new(sink);
        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Session {} connected", handle.id());
        SessionGuard::new(handle, self.clone())
    }

    /// Register a new connection backed by a [`ChannelSink`] sized from config.
    pub fn connect_channel(
        self: &Arc<Self>,
    ) -> (SessionGuard, mpsc::Receiver<JsonRpcNotification>) {
        let (sink, rx) = ChannelSink::channel(
            self.config.notification_buffer,
            Duration::from_millis(self.config.notification_timeout_ms),
        );
        (self.connect(sink), rx)
    }

    /// Signal that a resource changed. Subscribers get `notifications/resources/updated`.
    pub async fn notify_resource_updated(&self, uri: impl Into<ResourceUri>) {
        self.subscriptions.notify_updated(uri).await;
    }

    /// Replace a resource's text content, then notify its subscribers.
    pub async fn update_resource(&self, uri: impl Into<ResourceUri>, text: impl Into<String>) {
        let uri = uri.into();
        self.resources.set_text(uri.clone(), text).await;
        self.subscriptions.notify_updated(uri).await;
    }

    pub(crate) async fn disconnect(&self, handle: &SessionHandle) {
        self.subscriptions.cleanup_session(handle).await;
        self.active_sessions.fetch_sub(1, Ordering::SeqCst);
        tracing::info!("Session {} disconnected", handle.id());
    }

    pub(crate) fn try_disconnect(&self, handle: &SessionHandle) -> bool {
        if !self.subscriptions.try_cleanup_session(handle) {
            return false;
        }
        self.active_sessions.fetch_sub(1, Ordering::SeqCst);
        tracing::info!("Session {} dropped", handle.id());
        true
    }
}
