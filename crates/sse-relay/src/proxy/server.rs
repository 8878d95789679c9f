//! ProxyServer struct and main run loop.
//!
//! One task per inbound connection: the accept loop spawns every
//! connection onto a `TaskTracker` so a termination signal can stop
//! accepting, then drain in-flight sessions for a bounded grace
//! period. Sessions never share mutable state; they only read the
//! `Arc<ProxyContext>`.

use super::client::create_http_client;
use super::handler::{handle_request, ProxyContext};
use super::network::create_reusable_listener;
use crate::config::Config;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// The streaming reverse proxy server.
pub struct ProxyServer {
    config: Arc<Config>,
    ctx: Arc<ProxyContext>,
}

impl ProxyServer {
    /// Create a new server from validated configuration.
    ///
    /// Fails fast if the upstream URL is malformed; a bad target is a
    /// startup error, never a per-request one.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let target = config
            .upstream
            .target()
            .map_err(|e| anyhow::anyhow!("Invalid upstream configuration: {e}"))?;

        let http_client = create_http_client(&config);

        let ctx = Arc::new(ProxyContext {
            http_client,
            target,
            upstream_url: config.upstream.url.clone(),
            response_headers_timeout: config.timeouts.response_headers_secs.map(Duration::from_secs),
        });

        Ok(Self {
            config: Arc::new(config),
            ctx,
        })
    }

    /// Bind the configured port and serve until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), anyhow::Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.listen.port));
        let listener = create_reusable_listener(addr)?;
        self.run_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` fires.
    pub async fn run_on(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), anyhow::Error> {
        let addr = listener.local_addr()?;
        info!("Listening on http://{}", addr);
        info!("Proxying to {}", self.ctx.upstream_url);
        info!("Health check: /health");
        match self.ctx.response_headers_timeout {
            Some(t) => info!("Upstream response-header timeout: {}s", t.as_secs()),
            None => info!("Upstream response-header timeout: unbounded (streaming)"),
        }

        let sessions = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => {
                    let (stream, remote_addr) = accepted?;
                    let ctx = Arc::clone(&self.ctx);
                    sessions.spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let ctx = Arc::clone(&ctx);
                            async move { handle_request(&ctx, req).await }
                        });

                        // No idle or total timeout on the connection:
                        // an SSE session may legitimately stay open for
                        // hours with heartbeat-only traffic.
                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            // Mostly client resets mid-stream; expected
                            // for abandoned SSE sessions.
                            debug!("Connection from {} ended with error: {}", remote_addr, err);
                        }
                    });
                }
            }
        }

        info!("Termination signal received, no longer accepting connections");
        drop(listener);

        sessions.close();
        let grace = Duration::from_secs(self.config.listen.shutdown_grace_secs);
        if tokio::time::timeout(grace, sessions.wait()).await.is_err() {
            warn!(
                "In-flight sessions still active after {}s grace period, exiting anyway",
                grace.as_secs()
            );
        }

        info!("Proxy server stopped");
        Ok(())
    }

    /// The configuration this server was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
