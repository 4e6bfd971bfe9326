//! Batched resource updates with one notification per changed URI.

use std::collections::HashSet;

use super::manager::SessionManager;
use crate::subscriptions::ResourceUri;

/// Collects resource changes and publishes them together.
///
/// On commit, all new content is stored first and then each distinct URI is
/// notified once, in the order it was first touched.
pub struct UpdateBatch<'a> {
    manager: &'a SessionManager,
    texts: Vec<(ResourceUri, String)>,
    touched: Vec<ResourceUri>,
}

impl<'a> UpdateBatch<'a> {
    /// Start a batch against the given manager.
    pub fn new(manager: &'a SessionManager) -> Self {
        Self {
            manager,
            texts: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// Queue new text content for a resource.
    pub fn set_text(&mut self, uri: impl Into<ResourceUri>, text: impl Into<String>) -> &mut Self {
        let uri = uri.into();
        self.touched.push(uri.clone());
        self.texts.push((uri, text.into()));
        self
    }

    /// Queue a notification without changing stored content.
    pub fn touch(&mut self, uri: impl Into<ResourceUri>) -> &mut Self {
        self.touched.push(uri.into());
        self
    }

    /// Whether nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Store queued content and notify subscribers. Returns the number of
    /// distinct URIs notified.
    pub async fn commit(self) -> usize {
        for (uri, text) in self.texts {
            self.manager.resources().set_text(uri, text).await;
        }

        let mut seen = HashSet::new();
        let mut notified = 0;
        for uri in self.touched {
            if !seen.insert(uri.clone()) {
                continue;
            }
            self.manager.subscriptions().notify_updated(uri).await;
            notified += 1;
        }
        notified
    }
}
