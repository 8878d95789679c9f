//! Per-request dispatch.
//!
//! `GET /health` is answered locally; everything else goes through the
//! streaming forwarding pipeline. Each request is handled by its own
//! task and shares only the immutable [`ProxyContext`] with other
//! sessions.

use super::client::HttpClient;
use super::forwarding::forward_streaming;
use crate::config::UpstreamTarget;
use crate::health::{health_payload, HEALTH_PATH};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Duration;
use tracing::info;

/// Immutable per-process state shared by all sessions.
pub struct ProxyContext {
    pub http_client: HttpClient,
    pub target: UpstreamTarget,
    /// Upstream URL as configured, echoed in the health payload.
    pub upstream_url: String,
    /// Optional bound on the wait for upstream response headers.
    pub response_headers_timeout: Option<Duration>,
}

/// Handle one inbound request.
pub async fn handle_request(
    ctx: &ProxyContext,
    req: Request<Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
    if req.method() == Method::GET && req.uri().path() == HEALTH_PATH {
        return Ok(health_response(&ctx.upstream_url));
    }

    info!(method = %req.method(), path = %req.uri().path(), "Proxying request");

    Ok(forward_streaming(
        &ctx.http_client,
        &ctx.target,
        ctx.response_headers_timeout,
        req,
    )
    .await)
}

fn health_response(target: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    let body = health_payload(target).to_string();
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(BoxBody::new(
            Full::new(Bytes::from(body)).map_err(|never: Infallible| match never {}),
        ))
        .expect("static health response construction cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_is_json_ok() {
        let response = health_response("https://origin.example.com");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
