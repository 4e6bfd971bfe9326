//! Session management: connection identity, notification sinks, and disconnect cleanup.

pub mod guard;
pub mod handle;
pub mod manager;
pub mod transaction;

pub use guard::SessionGuard;
pub use handle::{ChannelSink, NotificationSink, SessionHandle, SessionId};
pub use manager::SessionManager;
pub use transaction::UpdateBatch;
