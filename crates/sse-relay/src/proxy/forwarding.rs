//! Streaming request forwarding to the upstream.
//!
//! The forwarding pipeline never materializes a body on either side:
//! the inbound request body is handed to the client connection as a
//! stream, and the upstream response body is wrapped in
//! [`RelayBody`](super::body::RelayBody) and relayed frame by frame.
//!
//! Error handling is asymmetric by design. Before the upstream
//! response headers have been received nothing has reached the client,
//! so failures surface as a 502/504 with a plain-text body. Once
//! headers are on the wire the status line is immutable; mid-stream
//! failures can only close both connections (see `body.rs`).

use super::body::RelayBody;
use super::client::HttpClient;
use super::headers::{rewrite_request_headers, rewrite_response_headers};
use crate::config::UpstreamTarget;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode, Uri};
use std::convert::Infallible;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Failure before any response byte reached the client.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, TLS failure, or a protocol
    /// error before response headers arrived.
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    /// The optional response-header deadline elapsed.
    #[error("timed out after {0:?} waiting for upstream response headers")]
    HeadersTimeout(Duration),
}

impl UpstreamError {
    fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Request(_) => StatusCode::BAD_GATEWAY,
            UpstreamError::HeadersTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

fn full_body(text: String) -> BoxBody<Bytes, hyper::Error> {
    BoxBody::new(Full::new(Bytes::from(text)).map_err(|never: Infallible| match never {}))
}

/// Build a plain-text error response.
pub fn error_response(status: StatusCode, message: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain; charset=utf-8")
        .body(full_body(format!("{message}\n")))
        .expect("static error response construction cannot fail")
}

/// Rewrite the inbound URI onto the upstream authority, preserving
/// path and query verbatim.
fn build_upstream_uri(target: &UpstreamTarget, inbound: &Uri) -> Result<Uri, hyper::http::Error> {
    let path_and_query = inbound
        .path_and_query()
        .map(|pq| pq.as_str())
        .filter(|pq| !pq.is_empty())
        .unwrap_or("/");

    Uri::builder()
        .scheme(target.scheme.clone())
        .authority(target.authority.clone())
        .path_and_query(path_and_query)
        .build()
}

/// Forward one inbound request to the upstream and stream the response
/// back.
///
/// At most one upstream connection is opened per call. The optional
/// `response_headers_timeout` bounds only the wait for upstream
/// response headers; the streaming body that follows is never subject
/// to a deadline.
pub async fn forward_streaming(
    http_client: &HttpClient,
    target: &UpstreamTarget,
    response_headers_timeout: Option<Duration>,
    req: Request<Incoming>,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    let (parts, inbound_body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let upstream_uri = match build_upstream_uri(target, &parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            error!(method = %method, path = %path, "Failed to build upstream URI: {e}");
            return error_response(StatusCode::BAD_GATEWAY, "Failed to build upstream URI");
        }
    };

    debug!(method = %method, uri = %upstream_uri, "Forwarding (streaming)");

    // Pass the request body through without buffering so chunked
    // uploads never block on full collection.
    let mut upstream_req = Request::builder()
        .method(parts.method)
        .uri(upstream_uri)
        .body(BoxBody::new(inbound_body))
        .expect("validated method and URI cannot produce an invalid request");
    *upstream_req.headers_mut() = parts.headers;
    rewrite_request_headers(upstream_req.headers_mut(), &target.host);

    let outcome = match response_headers_timeout {
        Some(deadline) => match tokio::time::timeout(deadline, http_client.request(upstream_req)).await {
            Ok(result) => result.map_err(UpstreamError::from),
            Err(_) => Err(UpstreamError::HeadersTimeout(deadline)),
        },
        None => http_client
            .request(upstream_req)
            .await
            .map_err(UpstreamError::from),
    };

    match outcome {
        Ok(upstream_response) => {
            let (mut parts, upstream_body) = upstream_response.into_parts();
            let status = parts.status.as_u16();

            // Applied exactly once: after upstream headers arrive and
            // before any body byte is written to the client.
            rewrite_response_headers(&mut parts.headers);

            debug!(method = %method, path = %path, status, "Upstream headers received");

            Response::from_parts(
                parts,
                BoxBody::new(RelayBody::new(upstream_body, method, path, status)),
            )
        }
        Err(e) => {
            // Pre-flush path: nothing was sent yet, so the failure can
            // still be surfaced as a status code.
            error!(method = %method, path = %path, "{e}");
            error_response(e.status(), &e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;

    fn target(url: &str) -> UpstreamTarget {
        UpstreamConfig {
            url: url.to_string(),
        }
        .target()
        .unwrap()
    }

    #[test]
    fn test_error_response_is_plain_text() {
        let response = error_response(StatusCode::BAD_GATEWAY, "connection refused");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_error_response_504() {
        let response = error_response(StatusCode::GATEWAY_TIMEOUT, "timed out");
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_build_upstream_uri_preserves_path_and_query() {
        let target = target("https://origin.example.com");
        let inbound: Uri = "http://localhost:10000/events.json?auth=abc&print=silent"
            .parse()
            .unwrap();

        let uri = build_upstream_uri(&target, &inbound).unwrap();
        assert_eq!(
            uri.to_string(),
            "https://origin.example.com/events.json?auth=abc&print=silent"
        );
    }

    #[test]
    fn test_build_upstream_uri_defaults_root_path() {
        let target = target("http://127.0.0.1:8000");
        let inbound: Uri = "http://localhost:10000".parse().unwrap();

        let uri = build_upstream_uri(&target, &inbound).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:8000/");
    }

    #[test]
    fn test_upstream_error_status_mapping() {
        let timeout = UpstreamError::HeadersTimeout(Duration::from_secs(30));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
