//! Resource subscription registry: who gets told when a resource changes.

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::session::SessionHandle;
use crate::types::ResourceUpdatedParams;

use super::uri::ResourceUri;

type SubscriptionMap = HashMap<ResourceUri, HashSet<SessionHandle>>;

/// Maps resource URIs to the sessions subscribed to them.
///
/// Every read and write goes through one lock. A URI is present as a key only
/// while at least one session is subscribed to it. The lock is never held
/// while delivering notifications.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: Mutex<SubscriptionMap>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session to updates of `uri`. Subscribing twice is a no-op.
    pub async fn subscribe(&self, uri: impl Into<ResourceUri>, session: &SessionHandle) {
        let uri = uri.into();
        let mut subscriptions = self.subscriptions.lock().await;
        let added = subscriptions
            .entry(uri.clone())
            .or_default()
            .insert(session.clone());
        drop(subscriptions);

        if added {
            tracing::debug!("Session {} subscribed to resource: {uri}", session.id());
        }
    }

    /// Unsubscribe a session from `uri`. Unknown pairs are ignored.
    pub async fn unsubscribe(&self, uri: impl Into<ResourceUri>, session: &SessionHandle) {
        let uri = uri.into();
        let mut subscriptions = self.subscriptions.lock().await;
        let Some(sessions) = subscriptions.get_mut(&uri) else {
            return;
        };
        let removed = sessions.remove(session);
        if sessions.is_empty() {
            subscriptions.remove(&uri);
        }
        drop(subscriptions);

        if removed {
            tracing::debug!("Session {} unsubscribed from resource: {uri}", session.id());
        }
    }

    /// Tell every current subscriber of `uri` that it changed.
    ///
    /// Subscribers are snapshotted under the lock; deliveries then run
    /// concurrently with the lock released. A failed or panicking delivery is
    /// logged and does not affect the others, and the subscription is kept.
    /// Returns once every attempt has finished.
    pub async fn notify_updated(&self, uri: impl Into<ResourceUri>) {
        let uri = uri.into();
        let sessions: Vec<SessionHandle> = {
            let subscriptions = self.subscriptions.lock().await;
            match subscriptions.get(&uri) {
                Some(sessions) => sessions.iter().cloned().collect(),
                None => return,
            }
        };

        let notification = ResourceUpdatedParams {
            uri: uri.to_string(),
        }
        .into_notification();

        let mut deliveries = JoinSet::new();
        for session in sessions {
            let notification = notification.clone();
            deliveries.spawn(async move {
                let result = session.notify(notification).await;
                (session, result)
            });
        }
        let attempted = deliveries.len();

        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((session, Err(e))) => {
                    tracing::warn!(
                        "Failed to notify session {} of update to {uri}: {e}",
                        session.id()
                    );
                }
                Err(e) => {
                    tracing::warn!("Notification delivery for {uri} aborted: {e}");
                }
            }
        }

        tracing::debug!("Notified {attempted} subscriber(s) of resource update: {uri}");
    }

    /// Remove every subscription held by a session. Call once when it disconnects.
    pub async fn cleanup_session(&self, session: &SessionHandle) {
        let mut subscriptions = self.subscriptions.lock().await;
        let removed = remove_session(&mut subscriptions, session);
        drop(subscriptions);

        if removed > 0 {
            tracing::debug!(
                "Cleaned up {removed} subscription(s) for disconnected session {}",
                session.id()
            );
        }
    }

    /// Cleanup without awaiting, for use from `Drop`.
    ///
    /// Returns `false` if the lock is currently held; the caller must then
    /// schedule [`cleanup_session`](Self::cleanup_session) instead.
    pub fn try_cleanup_session(&self, session: &SessionHandle) -> bool {
        match self.subscriptions.try_lock() {
            Ok(mut subscriptions) => {
                remove_session(&mut subscriptions, session);
                true
            }
            Err(_) => false,
        }
    }

    /// Total number of (uri, session) subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.lock().await.values().map(HashSet::len).sum()
    }

    /// Number of distinct URIs with at least one subscriber.
    pub async fn resource_count(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    /// Whether `session` is subscribed to `uri`.
    pub async fn is_subscribed(
        &self,
        uri: impl Into<ResourceUri>,
        session: &SessionHandle,
    ) -> bool {
        let uri = uri.into();
        self.subscriptions
            .lock()
            .await
            .get(&uri)
            .is_some_and(|sessions| sessions.contains(session))
    }

    /// Number of sessions subscribed to `uri`.
    pub async fn subscriber_count(&self, uri: impl Into<ResourceUri>) -> usize {
        let uri = uri.into();
        self.subscriptions
            .lock()
            .await
            .get(&uri)
            .map_or(0, HashSet::len)
    }

    #[cfg(test)]
    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, SubscriptionMap> {
        self.subscriptions.lock().await
    }

    /// URIs a session is subscribed to, sorted.
    pub async fn session_subscriptions(&self, session: &SessionHandle) -> Vec<ResourceUri> {
        let mut uris: Vec<ResourceUri> = self
            .subscriptions
            .lock()
            .await
            .iter()
            .filter(|(_, sessions)| sessions.contains(session))
            .map(|(uri, _)| uri.clone())
            .collect();
        uris.sort();
        uris
    }
}

/// Drop `session` from every set, removing keys left empty. Returns how many
/// subscriptions were removed.
fn remove_session(subscriptions: &mut SubscriptionMap, session: &SessionHandle) -> usize {
    let mut removed = 0;
    subscriptions.retain(|_, sessions| {
        if sessions.remove(session) {
            removed += 1;
        }
        !sessions.is_empty()
    });
    removed
}
