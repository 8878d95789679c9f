use anyhow::Context;
use clap::Parser;
use sse_relay::{Config, ProxyServer};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sse-relay", version, about = "Streaming-aware SSE reverse proxy")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Upstream base URL (scheme + host), e.g. https://origin.example.com
    #[arg(short, long, env = "UPSTREAM_URL")]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "sse_relay=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let mut config =
                Config::from_file(path).with_context(|| format!("Failed to load config from {path}"))?;
            // CLI flags and environment take precedence over the file.
            if let Some(port) = args.port {
                config.listen.port = port;
            }
            if let Some(url) = args.upstream {
                config.upstream.url = url;
            }
            config.validate()?;
            config
        }
        None => {
            let url = args
                .upstream
                .context("An upstream is required: pass --upstream, set UPSTREAM_URL, or provide --config")?;
            let port = args
                .port
                .unwrap_or_else(|| sse_relay::config::ListenConfig::default().port);
            Config::from_target(port, url)?
        }
    };

    info!("sse-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let server = ProxyServer::new(config)?;
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    server.run(shutdown).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Translate SIGTERM/SIGINT into a cancellation so the accept loop can
/// stop taking connections and drain in-flight sessions.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down gracefully"),
                _ = sigterm.recv() => info!("SIGTERM received, shutting down gracefully"),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
            info!("Ctrl+C received, shutting down gracefully");
        }
        shutdown.cancel();
    });
}
