//! Disconnect finalizer for a connected session.

use std::sync::Arc;

use super::handle::{SessionHandle, SessionId};
use super::manager::SessionManager;

/// Owns a session's registration with the [`SessionManager`].
///
/// Call [`close`](Self::close) when the connection ends. If the guard is
/// dropped instead (task cancelled, early return, panic), the session's
/// subscriptions are removed from `Drop`, immediately when the registry lock
/// is free and otherwise on a spawned task.
pub struct SessionGuard {
    handle: SessionHandle,
    manager: Arc<SessionManager>,
    closed: bool,
}

impl SessionGuard {
    pub(crate) fn new(handle: SessionHandle, manager: Arc<SessionManager>) -> Self {
        Self {
            handle,
            manager,
            closed: false,
        }
    }

    /// The guarded session.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The guarded session's id.
    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// End the session and remove all of its subscriptions.
    pub async fn close(mut self) {
        self.manager.disconnect(&self.handle).await;
        self.closed = true;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if self.manager.try_disconnect(&self.handle) {
            return;
        }

        let manager = self.manager.clone();
        let handle = self.handle.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    manager.disconnect(&handle).await;
                });
            }
            Err(_) => {
                tracing::error!(
                    "Session {} dropped outside a runtime with the registry busy; subscriptions not cleaned up",
                    handle.id()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::ServerConfig;
    use crate::session::SessionManager;

    #[tokio::test]
    async fn test_close_cancelled_while_waiting_still_cleans_up() {
        let manager = Arc::new(SessionManager::new(ServerConfig::default()));
        let (guard, _notifications) = manager.connect_channel();
        manager
            .subscriptions()
            .subscribe("res://a", guard.handle())
            .await;

        let held = manager.subscriptions().lock().await;
        let mut closing = tokio_test::task::spawn(guard.close());
        assert!(closing.poll().is_pending());
        drop(closing);
        drop(held);

        for _ in 0..100 {
            if manager.active_sessions() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.active_sessions(), 0);
        assert_eq!(manager.subscriptions().subscription_count().await, 0);
    }
}
