//! Stratus S3 Server - S3-compatible object storage gateway.
//!
//! This binary serves the S3 2006-03-01 REST dialect on top of
//! `stratus-s3-http` and the in-process `stratus-s3-core` gateway. It handles
//! path-style and virtual-hosted-style addressing and exposes a health check
//! endpoint for orchestration systems.
//!
//! # Usage
//!
//! ```text
//! STRATUS_LISTEN=0.0.0.0:4583 stratus-s3-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STRATUS_LISTEN` | `0.0.0.0:4583` | Bind address |
//! | `STRATUS_DOMAIN` | `s3.localhost` | Virtual hosting domain |
//! | `STRATUS_VIRTUAL_HOSTING` | `true` | Enable virtual-hosted-style addressing |
//! | `STRATUS_REGION` | `us-east-1` | Region reported by GetBucketLocation |
//! | `STRATUS_MAX_MEMORY_OBJECT_SIZE` | `524288` | Spill-to-disk threshold (bytes) |
//! | `STRATUS_CREDENTIALS` | `STRATUSEXAMPLEKEY=stratus-dev` | `accessKey=canonicalId` pairs |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod handler;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stratus_s3_core::{GatewayConfig, StratusGateway};
use stratus_s3_http::service::{S3HttpConfig, S3HttpService};

use crate::handler::StratusHandler;

/// Server version reported in startup logs.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`S3HttpConfig`] from the gateway configuration.
fn build_http_config(config: &GatewayConfig) -> S3HttpConfig {
    S3HttpConfig {
        domain: config.domain.clone(),
        virtual_hosting: config.virtual_hosting,
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<H: stratus_s3_http::dispatch::S3Handler>(
    listener: TcpListener,
    service: S3HttpService<H>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                // Stamp the peer address so bucket policies can match on
                // aws:SourceIp.
                let svc = service.for_peer(peer_addr.ip());
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting the
/// health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET /_stratus/health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = GatewayConfig::from_env();
        let addr = config.listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = GatewayConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen,
        domain = %config.domain,
        virtual_hosting = config.virtual_hosting,
        region = %config.region,
        version = VERSION,
        "starting Stratus S3 Server",
    );

    let http_config = build_http_config(&config);
    let gateway = StratusGateway::new(config.clone());
    let handler = StratusHandler::new(gateway);
    let service = S3HttpService::new(handler, &http_config);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
