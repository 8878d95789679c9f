//! Streaming proxy core.
//!
//! Owns the full request lifecycle: receive an inbound request, open
//! the upstream exchange, rewrite headers for end-to-end streaming
//! semantics, and relay the response body chunk by chunk with no
//! buffering window.
//!
//! # Module Structure
//!
//! - `server` - ProxyServer struct, accept loop, graceful shutdown
//! - `handler` - per-request dispatch (health vs forwarding)
//! - `forwarding` - streaming forwarding pipeline and error paths
//! - `headers` - pure header-rewrite transformations
//! - `body` - pass-through response body with session accounting
//! - `client` - shared HTTP client creation and configuration
//! - `network` - listener utilities (SO_REUSEADDR/SO_REUSEPORT)

mod body;
mod client;
mod forwarding;
mod handler;
mod headers;
mod network;
mod server;

#[cfg(test)]
mod tests;

pub use client::{create_http_client, HttpClient};
pub use handler::{handle_request, ProxyContext};
pub use network::create_reusable_listener;
pub use server::ProxyServer;
