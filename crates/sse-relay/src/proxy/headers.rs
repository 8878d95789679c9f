//! Header rewriting for streaming semantics.
//!
//! Both rewrites are pure transformations over a `HeaderMap`, applied
//! exactly once per exchange: the outbound rewrite before the request
//! leaves for the upstream, the response rewrite after upstream headers
//! arrive and before any body byte is written to the client.

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::header::{CACHE_CONTROL, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};

pub static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub static ACCEPT_EVENT_STREAM: HeaderValue = HeaderValue::from_static("text/event-stream");
pub static CONTENT_TYPE_EVENT_STREAM: HeaderValue =
    HeaderValue::from_static("text/event-stream; charset=utf-8");
pub static NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache");
pub static NO_CACHE_NO_TRANSFORM: HeaderValue = HeaderValue::from_static("no-cache, no-transform");
pub static KEEP_ALIVE: HeaderValue = HeaderValue::from_static("keep-alive");
pub static BUFFERING_OFF: HeaderValue = HeaderValue::from_static("no");

/// Rewrite inbound request headers for the upstream.
///
/// The `Host` header is replaced with the upstream authority and the
/// SSE-friendly request headers are forced. Everything else passes
/// through verbatim.
pub fn rewrite_request_headers(headers: &mut HeaderMap, upstream_host: &HeaderValue) {
    headers.insert(HOST, upstream_host.clone());
    headers.insert(hyper::header::ACCEPT, ACCEPT_EVENT_STREAM.clone());
    headers.insert(CACHE_CONTROL, NO_CACHE.clone());
    headers.insert(CONNECTION, KEEP_ALIVE.clone());
}

/// Rewrite upstream response headers before they reach the client.
///
/// `Content-Length` and `Transfer-Encoding` are dropped: either one
/// lets an intermediary buffer the full body before forwarding, which
/// defeats streaming. The SSE content type and cache directives are
/// forced, and `X-Accel-Buffering: no` disables buffering in reverse
/// proxies that honor it.
pub fn rewrite_response_headers(headers: &mut HeaderMap) {
    headers.remove(CONTENT_LENGTH);
    headers.remove(TRANSFER_ENCODING);
    headers.insert(CONTENT_TYPE, CONTENT_TYPE_EVENT_STREAM.clone());
    headers.insert(CACHE_CONTROL, NO_CACHE_NO_TRANSFORM.clone());
    headers.insert(CONNECTION, KEEP_ALIVE.clone());
    headers.insert(X_ACCEL_BUFFERING.clone(), BUFFERING_OFF.clone());
}
