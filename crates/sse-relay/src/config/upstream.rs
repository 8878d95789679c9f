//! Upstream, connection pool, and timeout configuration.

use hyper::header::HeaderValue;
use hyper::http::uri::{Authority, Scheme};
use hyper::Uri;
use serde::{Deserialize, Serialize};

/// The single upstream origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Absolute base URL (scheme + host, e.g. "https://origin.example.com").
    pub url: String,
}

impl UpstreamConfig {
    /// Parse and validate the upstream URL into its pre-resolved parts.
    ///
    /// Called once at startup; the resulting [`UpstreamTarget`] is shared
    /// read-only across all sessions so no per-request URL parsing happens.
    pub fn target(&self) -> Result<UpstreamTarget, String> {
        if self.url.is_empty() {
            return Err("upstream URL must not be empty".to_string());
        }

        let uri: Uri = self
            .url
            .parse()
            .map_err(|e| format!("invalid upstream URL '{}': {e}", self.url))?;

        let scheme = uri
            .scheme()
            .cloned()
            .ok_or_else(|| format!("upstream URL '{}' is missing a scheme", self.url))?;
        if scheme != Scheme::HTTP && scheme != Scheme::HTTPS {
            return Err(format!(
                "unsupported upstream scheme '{}'. Currently supported: http, https",
                scheme
            ));
        }

        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| format!("upstream URL '{}' is missing a host", self.url))?;

        let host = HeaderValue::from_str(authority.as_str())
            .map_err(|_| format!("upstream host '{}' is not a valid Host header", authority))?;

        Ok(UpstreamTarget {
            scheme,
            authority,
            host,
        })
    }
}

/// Pre-parsed upstream authority, computed once at startup.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub scheme: Scheme,
    pub authority: Authority,
    /// `Host` header value forced onto every outbound request.
    pub host: HeaderValue,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionPoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout_secs: u64,
    pub keepalive_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_pool_max_idle_per_host(),
            idle_timeout_secs: default_pool_idle_timeout(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_pool_max_idle_per_host() -> usize {
    100
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_keepalive_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}

/// Request timeout policy.
///
/// The bound covers only the exchange up to the upstream response
/// headers. An active streaming body is never subject to a timeout:
/// an idle SSE stream that only sends heartbeats for minutes must not
/// be killed by a generic request deadline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Seconds to wait for upstream response headers. Absent means
    /// unbounded; connection establishment is still bounded by
    /// `connection_pool.connect_timeout_secs`.
    pub response_headers_secs: Option<u64>,
}
