use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use crate::game::entities::{Game, GameId, PlayerId};

/// A serialized envelope ready to be written to a socket. Shared between
/// every mailbox it is delivered to.
pub type Frame = Arc<str>;

/// An envelope sent by a game or lobby socket client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Drop a token. Game sockets only.
    #[serde(rename_all = "camelCase")]
    Move { player_id: PlayerId, column: i64 },
    /// Take the open seat of a waiting game, or enter matchmaking on the
    /// lobby socket.
    #[serde(rename_all = "camelCase")]
    JoinGame { player_id: PlayerId },
    /// Propose a rematch to the other participant.
    #[serde(rename_all = "camelCase")]
    ResetRequest { player_id: PlayerId },
    /// Accept or refuse a pending rematch proposal.
    #[serde(rename_all = "camelCase")]
    ResetConfirm { player_id: PlayerId, confirm: bool },
}

impl ClientMessage {
    pub fn player_id(&self) -> &str {
        match self {
            Self::Move { player_id, .. }
            | Self::JoinGame { player_id }
            | Self::ResetRequest { player_id }
            | Self::ResetConfirm { player_id, .. } => player_id,
        }
    }

    /// Decodes a text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Move { .. } => "move",
            Self::JoinGame { .. } => "joinGame",
            Self::ResetRequest { .. } => "resetRequest",
            Self::ResetConfirm { .. } => "resetConfirm",
        };
        write!(f, "{repr}")
    }
}

/// An envelope pushed to socket clients.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full game snapshot after any change.
    GameState(Game),
    /// A rejected or malformed inbound envelope.
    Error { error: String },
    /// Delivered only to the participant being asked for a rematch.
    #[serde(rename_all = "camelCase")]
    ResetRequest { requesting_player_id: PlayerId },
    /// The board was cleared. Always followed by a `gameState`.
    ResetGame,
    #[serde(rename_all = "camelCase")]
    ResetRejected { rejecting_player_id: PlayerId },
    /// Lobby matchmaking opened a new game and is waiting for an opponent.
    #[serde(rename_all = "camelCase")]
    GameCreated { game_id: GameId, player1_id: PlayerId },
    /// Lobby matchmaking paired two players.
    #[serde(rename_all = "camelCase")]
    GameStart {
        game_id: GameId,
        player1_id: PlayerId,
        player2_id: PlayerId,
    },
    /// First envelope on a lobby socket.
    Connected { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}
