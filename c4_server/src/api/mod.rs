//! HTTP/WebSocket API for the Connect-Four server.
//!
//! # Modules
//!
//! - [`players`]: player registration, lookup and the leaderboard
//! - [`games`]: game creation, moves, resets and REST matchmaking
//! - [`websocket`]: per-game and lobby sockets
//! - [`middleware`]: request IDs, request logging and HTTP metrics
//! - [`rate_limiter`]: inbound socket message limits
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health
//! GET  /api/players                 POST /api/players {username}
//! GET  /api/players/{id}
//! GET  /api/leaderboard?limit=N
//! GET  /api/games                   POST /api/games {gameType, player1Id, player2Id?}
//! GET  /api/games/{id}
//! POST /api/games/{id}/move         {playerId, column}
//! POST /api/games/{id}/reset
//! POST /api/matchmaking             {playerId}
//! GET  /ws/game/{id}[?playerId=]    (WebSocket)
//! GET  /ws/lobby                    (WebSocket)
//! ```
//!
//! Create endpoints answer `201 Created`. Failures carry `{"error": "..."}`
//! with 400, 404 or 500.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use c4_server::{api::{create_router, AppState}, config::ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(ServerConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; browser clients are served from other
//! origins.

pub mod games;
pub mod middleware;
pub mod players;
pub mod rate_limiter;
pub mod websocket;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use connect_four::{ErrorKind, GameService, SessionError};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GameService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds a fresh game service from the server configuration.
    pub fn new(config: ServerConfig) -> Self {
        let service = GameService::new(&config.engine_config());
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Maps an engine error onto a status code and client-safe message.
pub(crate) fn session_error(err: SessionError) -> ApiError {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => {
            log::error!("Request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Unwraps a JSON body, answering a malformed one with a 400 `{error}`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| bad_request(format!("Invalid request body: {}", rejection.body_text())))
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/players", get(players::list_players).post(players::create_player))
        .route("/players/{player_id}", get(players::get_player))
        .route("/leaderboard", get(players::leaderboard))
        .route("/games", get(games::list_games).post(games::create_game))
        .route("/games/{game_id}", get(games::get_game))
        .route("/games/{game_id}/move", post(games::submit_move))
        .route("/games/{game_id}/reset", post(games::reset_game))
        .route("/matchmaking", post(games::matchmaking));

    let ws_routes = Router::new()
        .route("/game/{game_id}", get(websocket::game_socket_handler))
        .route("/lobby", get(websocket::lobby_socket_handler));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .nest("/ws", ws_routes)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:9000/health
/// # {"status":"healthy","version":"1.0.0","games":3,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let games = state.service.sessions().list_games().await.len();

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "games": games,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
