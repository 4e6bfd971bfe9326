//! Resource Subscriptions MCP Server — push resource update notifications to subscribed clients.
//!
//! Clients subscribe to resource URIs with `resources/subscribe`; when the
//! application signals that a resource changed, every subscribed session
//! receives `notifications/resources/updated`. Delivery is best-effort and a
//! session's subscriptions end with its connection.

pub mod config;
pub mod protocol;
pub mod resources;
pub mod session;
pub mod subscriptions;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use protocol::ProtocolHandler;
pub use session::{NotificationSink, SessionGuard, SessionHandle, SessionManager};
pub use subscriptions::{ResourceUri, SubscriptionRegistry};
pub use transport::StdioTransport;
