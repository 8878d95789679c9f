//! Health check payload.
//!
//! Served directly by the request handler without touching the
//! upstream, so it keeps answering 200 even when the origin is
//! unreachable.

use chrono::Utc;
use serde_json::{json, Value};

/// Path answered locally instead of being forwarded.
pub const HEALTH_PATH: &str = "/health";

/// Build the health payload for the configured upstream target.
pub fn health_payload(target: &str) -> Value {
    json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "target": target,
    })
}
