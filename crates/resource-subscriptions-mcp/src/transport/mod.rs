//! Transports: stdio for a single local client, SSE over HTTP for many.

pub mod sse;
pub mod stdio;

#[cfg(feature = "sse")]
pub use sse::SseTransport;
pub use stdio::StdioTransport;
