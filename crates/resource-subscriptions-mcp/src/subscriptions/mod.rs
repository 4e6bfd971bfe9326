//! Resource subscriptions: canonical URIs and the subscription registry.

pub mod registry;
pub mod uri;

pub use registry::SubscriptionRegistry;
pub use uri::ResourceUri;
