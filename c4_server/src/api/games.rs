//! Game management API handlers.
//!
//! This module provides HTTP REST endpoints for game operations including:
//! - Creating single-player, hot-seat and online games
//! - Listing games and fetching one game's state
//! - Submitting moves (the bot replies before the response is sent)
//! - One-shot resets without the socket handshake
//! - Find-or-create matchmaking
//!
//! Every state change is also broadcast to the game's sockets.
//!
//! # Examples
//!
//! Start a game against the computer:
//! ```bash
//! curl -X POST http://localhost:9000/api/games \
//!   -H "Content-Type: application/json" \
//!   -d '{"gameType": "single", "player1Id": "alice"}'
//! ```
//!
//! Drop a token in the centre column:
//! ```bash
//! curl -X POST http://localhost:9000/api/games/GAME_ID/move \
//!   -H "Content-Type: application/json" \
//!   -d '{"playerId": "alice", "column": 3}'
//! ```

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use connect_four::{Game, GameType, MatchOutcome, MatchStatus};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{ApiError, AppState, bad_request, json_body, session_error};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    #[serde(default)]
    pub game_type: String,
    #[serde(default)]
    pub player1_id: String,
    #[serde(default)]
    pub player2_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(default)]
    pub player_id: String,
    pub column: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakingRequest {
    #[serde(default)]
    pub player_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakingResponse {
    pub status: MatchStatus,
    pub game_id: String,
    pub player1_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2_id: Option<String>,
}

impl From<MatchOutcome> for MatchmakingResponse {
    fn from(outcome: MatchOutcome) -> Self {
        let game = outcome.game;
        Self {
            status: outcome.status,
            game_id: game.id,
            player1_id: game.player1_id,
            player2_id: (!game.player2_id.is_empty()).then_some(game.player2_id),
        }
    }
}

/// Create a game.
///
/// # Request Body
///
/// ```json
/// {"gameType": "single" | "local" | "online", "player1Id": "alice", "player2Id": "bob"}
/// ```
///
/// `player2Id` is optional: a single-player game seats the bot, a local game
/// seats `player1Id` twice, and an online game waits for an opponent.
///
/// # Response
///
/// Returns `201 Created` with the game. If the bot holds red, its opening
/// move has already been played.
///
/// # Errors
///
/// - `400 Bad Request`: unknown `gameType`, missing `player1Id`, malformed body
pub async fn create_game(
    State(state): State<AppState>,
    payload: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let request = json_body(payload)?;
    let game_type: GameType = request.game_type.trim().parse().map_err(bad_request)?;

    let game = state
        .service
        .create_game(game_type, &request.player1_id, request.player2_id.as_deref())
        .await
        .map_err(session_error)?;

    metrics::games_created_total(game.game_type);
    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn list_games(State(state): State<AppState>) -> Json<Vec<Game>> {
    Json(state.service.sessions().list_games().await)
}

/// # Errors
///
/// - `404 Not Found`: no game with that id
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    state
        .service
        .sessions()
        .get_game(&game_id)
        .await
        .map(Json)
        .map_err(session_error)
}

/// Apply a move for `playerId`.
///
/// # Response
///
/// Returns `200 OK` with the updated game, including the bot's reply when
/// it is the bot's turn.
///
/// # Errors
///
/// - `400 Bad Request`: game not active, not a participant, not their turn,
///   column out of range or full
/// - `404 Not Found`: no game with that id
pub async fn submit_move(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<Game>, ApiError> {
    let request = json_body(payload)?;
    let start = Instant::now();

    let game = state
        .service
        .submit_move(&game_id, &request.player_id, request.column)
        .await
        .map_err(session_error)?;

    logging::log_performance(
        "submit_move",
        start.elapsed().as_millis() as u64,
        Some(&game_id),
    );
    metrics::moves_applied_total();
    metrics::game_finished(&game);
    Ok(Json(game))
}

/// Reset a game immediately, without asking the opponent.
///
/// Sockets watching the game receive `resetGame` followed by `gameState`.
///
/// # Errors
///
/// - `404 Not Found`: no game with that id
pub async fn reset_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    state
        .service
        .reset_game(&game_id)
        .await
        .map(Json)
        .map_err(session_error)
}

/// Join the oldest open online game, or open a new one.
///
/// # Response
///
/// ```json
/// {"status": "matched", "gameId": "...", "player1Id": "bob", "player2Id": "alice"}
/// {"status": "waiting", "gameId": "...", "player1Id": "alice"}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing `playerId`, malformed body
pub async fn matchmaking(
    State(state): State<AppState>,
    payload: Result<Json<MatchmakingRequest>, JsonRejection>,
) -> Result<Json<MatchmakingResponse>, ApiError> {
    let request = json_body(payload)?;
    let outcome = state
        .service
        .matchmake(&request.player_id)
        .await
        .map_err(session_error)?;

    Ok(Json(outcome.into()))
}
