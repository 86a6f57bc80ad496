//! Player registration, lookup and leaderboard handlers.
//!
//! # Examples
//!
//! Register a player:
//! ```bash
//! curl -X POST http://localhost:9000/api/players \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice"}'
//! ```
//!
//! Top five players:
//! ```bash
//! curl "http://localhost:9000/api/leaderboard?limit=5"
//! ```

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use connect_four::{Player, session::DEFAULT_LEADERBOARD_LIMIT};
use serde::Deserialize;

use super::{ApiError, AppState, bad_request, json_body, session_error};

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    #[serde(default)]
    pub username: String,
}

/// `limit` is kept as text so a malformed value can be answered with the
/// usual `{error}` body.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<String>,
}

/// Register a new player.
///
/// # Response
///
/// Returns `201 Created` with the player record:
/// ```json
/// {"id": "6f1c...", "username": "alice", "wins": 0, "losses": 0, "createdAt": "..."}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: blank or duplicate username, malformed body
pub async fn create_player(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlayerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let request = json_body(payload)?;
    let player = state
        .service
        .sessions()
        .create_player(&request.username)
        .await
        .map_err(session_error)?;

    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn list_players(State(state): State<AppState>) -> Json<Vec<Player>> {
    Json(state.service.sessions().list_players().await)
}

/// # Errors
///
/// - `404 Not Found`: no player with that id
pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, ApiError> {
    state
        .service
        .sessions()
        .get_player(&player_id)
        .await
        .map(Json)
        .map_err(session_error)
}

/// Players ranked by wins, then fewest losses, then username.
///
/// `limit` defaults to 10; `limit=0` returns every player.
///
/// # Errors
///
/// - `400 Bad Request`: `limit` is not a non-negative integer
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let limit = parse_limit(query.limit.as_deref())?;
    Ok(Json(state.service.sessions().leaderboard(limit).await))
}

fn parse_limit(raw: Option<&str>) -> Result<usize, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_LEADERBOARD_LIMIT),
        Some(value) => value
            .parse()
            .map_err(|_| bad_request("limit must be a non-negative integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), DEFAULT_LEADERBOARD_LIMIT);
        assert_eq!(parse_limit(Some("")).unwrap(), DEFAULT_LEADERBOARD_LIMIT);
        assert_eq!(parse_limit(Some("0")).unwrap(), 0);
        assert_eq!(parse_limit(Some("25")).unwrap(), 25);

        for bad in ["ten", "-1", "1.5"] {
            let (status, _) = parse_limit(Some(bad)).unwrap_err();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
}
