//! sse-relay: a streaming-aware reverse proxy.
//!
//! Forwards all inbound HTTP traffic to a single fixed upstream origin
//! while preserving long-lived Server-Sent-Events connections: bytes
//! are relayed incrementally with no buffering window, a small set of
//! headers is rewritten to guarantee streaming semantics end-to-end,
//! and no timeout is applied to an active stream.

pub mod config;
pub mod health;
pub mod proxy;

pub use config::Config;
pub use proxy::ProxyServer;
