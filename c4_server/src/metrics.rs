//! Prometheus metrics for monitoring game server health and activity.
//!
//! Metrics go through the `metrics` facade and are only exported when an
//! exporter has been installed with [`init_metrics`]; otherwise every call
//! here is a no-op.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts, duration, status codes
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Game Metrics**: Games created, moves applied, games finished
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use c4_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/games", 201);
//! metrics::websocket_connection_opened();
//! ```

use connect_four::{Game, GameStatus, GameType};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// A socket finished its upgrade.
pub fn websocket_connection_opened() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// A socket was torn down.
pub fn websocket_connection_closed() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(endpoint: &str) {
    metrics::counter!("rate_limit_hits_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

pub fn games_created_total(game_type: GameType) {
    metrics::counter!("games_created_total",
        "type" => game_type.to_string()
    )
    .increment(1);
}

pub fn moves_applied_total() {
    metrics::counter!("moves_applied_total").increment(1);
}

/// Counts a finished game by result. Games still in play are ignored.
pub fn game_finished(game: &Game) {
    if game.status != GameStatus::Finished {
        return;
    }
    let result = if game.winner_id.is_empty() { "draw" } else { "win" };
    metrics::counter!("games_finished_total", "result" => result).increment(1);
}
