//! Game and player records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::{
    board::{Board, Token},
    constants::BOT_ID,
};
use crate::bot::{Agent, AgentConfig};

pub type GameId = String;
pub type PlayerId = String;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    /// Against the computer opponent.
    Single,
    /// Two players sharing one device.
    Local,
    /// Two players on separate connections, paired by id or matchmaking.
    Online,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Local => write!(f, "local"),
            Self::Online => write!(f, "online"),
        }
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "local" => Ok(Self::Local),
            "online" => Ok(Self::Online),
            other => Err(format!("unknown game type '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// A single drop-token game.
///
/// `player1_id` always plays red and `player2_id` yellow. Either seat may be
/// [`BOT_ID`]; `player2_id` is empty while an online game is waiting for an
/// opponent. `winner_id` is non-empty only on a game finished by a win.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    #[serde(rename = "type")]
    pub game_type: GameType,
    pub board: Board,
    pub current_turn: Token,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub winner_id: PlayerId,
    pub status: GameStatus,
    pub last_move_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,

    /// Token of the last winner. Kept beside `winner_id` because a hot-seat
    /// game has the same id in both seats.
    #[serde(skip)]
    pub(crate) winning_token: Option<Token>,

    /// Computer opponent bound to the bot seat, if any.
    #[serde(skip)]
    pub(crate) agent: Option<Agent>,
}

impl Game {
    /// Creates a `waiting` game with an empty board and red to move.
    pub fn new(game_type: GameType, player1_id: PlayerId, player2_id: PlayerId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            game_type,
            board: Board::new(),
            current_turn: Token::Red,
            player1_id,
            player2_id,
            winner_id: String::new(),
            status: GameStatus::Waiting,
            last_move_time: now,
            created_at: now,
            winning_token: None,
            agent: None,
        }
    }

    /// Binds an agent to the bot seat. Does nothing when neither seat is the
    /// bot.
    pub fn attach_agent(&mut self, config: AgentConfig) {
        self.agent = self
            .bot_token()
            .map(|token| Agent::new(BOT_ID.to_string(), token, config));
    }

    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    /// Player sitting behind `token`.
    pub fn seat(&self, token: Token) -> &str {
        match token {
            Token::Red => &self.player1_id,
            Token::Yellow => &self.player2_id,
        }
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        !player_id.is_empty() && (self.player1_id == player_id || self.player2_id == player_id)
    }

    /// The other participant's id. For a hot-seat game this is the same id.
    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if player_id.is_empty() {
            None
        } else if self.player1_id == player_id {
            Some(&self.player2_id)
        } else if self.player2_id == player_id {
            Some(&self.player1_id)
        } else {
            None
        }
    }

    pub fn has_bot(&self) -> bool {
        self.bot_token().is_some()
    }

    /// Token played by the bot seat. The first seat wins when both are bots.
    pub fn bot_token(&self) -> Option<Token> {
        if self.player1_id == BOT_ID {
            Some(Token::Red)
        } else if self.player2_id == BOT_ID {
            Some(Token::Yellow)
        } else {
            None
        }
    }

    /// True when the game is active and the bot holds the current turn.
    pub fn is_bot_turn(&self) -> bool {
        self.status == GameStatus::Active && self.bot_token() == Some(self.current_turn)
    }

    pub fn winning_token(&self) -> Option<Token> {
        self.winning_token
    }
}

/// A registered player and their record.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub wins: u32,
    pub losses: u32,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            wins: 0,
            losses: 0,
            created_at: Utc::now(),
        }
    }
}

/// A move request. Not stored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub player_id: PlayerId,
    pub column: i64,
}
