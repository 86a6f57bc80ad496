//! Connect-Four game server.
//!
//! Serves the REST API and the game/lobby WebSockets from one listener, with
//! an optional Prometheus exporter on a second address.

use std::net::SocketAddr;

use anyhow::{Context, Error};
use c4_server::{api, config::ServerConfig, logging, metrics};
use log::{info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Run a Connect-Four game server

USAGE:
  c4_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address     [default: env SERVER_BIND or 127.0.0.1:9000]
  --metrics-bind  IP:PORT  Prometheus exporter address     [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:9000)
  METRICS_BIND             Prometheus exporter address (e.g., 0.0.0.0:9090)
  BOT_TIME_BUDGET_MS       Bot thinking time per move         [default: 980]
  BOT_EARLY_DEPTH          Bot search depth, open board       [default: 7]
  BOT_LATE_DEPTH           Bot search depth, crowded board    [default: 9]
  RESET_REQUEST_TTL_SECS   Rematch proposal lifetime, 0 = off [default: 120]
  WS_IDLE_TIMEOUT_SECS     Close silent sockets after         [default: 120]
  WS_PING_INTERVAL_SECS    Keepalive ping interval            [default: 60]
  WS_MAILBOX_CAPACITY      Queued frames per socket           [default: 64]
  WS_BURST_LIMIT           Messages per second per socket     [default: 10]
  WS_SUSTAINED_LIMIT       Messages per minute per socket     [default: 100]
  RUST_LOG                 Log filter                         [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs
            .opt_value_from_str("--bind")
            .context("Invalid --bind address")?,
        metrics_bind: pargs
            .opt_value_from_str("--metrics-bind")
            .context("Invalid --metrics-bind address")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.metrics_bind)?;
    config.validate()?;
    info!("Loaded configuration: {config:?}");

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Prometheus metrics available at http://{addr}/metrics"),
            Err(e) => warn!("{e}; continuing without metrics"),
        }
    }

    let bind = config.bind;
    let app = api::create_router(api::AppState::new(config));

    info!("Starting HTTP/WebSocket server on {bind}");
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!("Server is running at http://{bind}. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
