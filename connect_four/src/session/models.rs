//! Session request and result models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::entities::Game;

/// Whether matchmaking paired the requester or left them waiting.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Matched,
    Waiting,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Waiting => write!(f, "waiting"),
        }
    }
}

/// Result of a find-or-create matchmaking request.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub status: MatchStatus,
    /// The joined game when matched, otherwise the requester's waiting game.
    pub game: Game,
}

/// Default number of leaderboard entries.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
