//! Move validation, win/draw detection and game reset.
//!
//! Nothing here knows about connections or storage. Callers store and
//! broadcast the game after a successful transition.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    board::{Board, Token},
    constants::BOARD_WIDTH,
    entities::{Game, GameStatus},
};

/// Reasons a move is rejected. Checked in declaration order.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("game is not active")]
    NotActive,
    #[error("player is not in this game")]
    NotParticipant,
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid column")]
    InvalidColumn,
    #[error("column is full")]
    ColumnFull,
}

/// What an accepted move did to the game.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoveOutcome {
    /// Play continues with the other token.
    Continue,
    /// The mover connected four.
    Won(Token),
    /// The board filled up without a winner.
    Draw,
}

impl MoveOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

impl Game {
    /// Drops the mover's token into `column`.
    ///
    /// On a win the game finishes with `winner_id` set to the mover; on a
    /// full board it finishes as a draw. Otherwise the turn passes to the
    /// other token. A rejected move leaves the game untouched.
    pub fn apply_move(&mut self, player_id: &str, column: i64) -> Result<MoveOutcome, GameError> {
        if self.status != GameStatus::Active {
            return Err(GameError::NotActive);
        }

        let token = self.mover_token(player_id)?;

        let col = usize::try_from(column)
            .ok()
            .filter(|&c| c < BOARD_WIDTH)
            .ok_or(GameError::InvalidColumn)?;

        let row = self
            .board
            .drop_token(col, token)
            .ok_or(GameError::ColumnFull)?;

        if self.board.connects_four(row, col, token) {
            self.status = GameStatus::Finished;
            self.winner_id = player_id.to_string();
            self.winning_token = Some(token);
            self.last_move_time = Utc::now();
            return Ok(MoveOutcome::Won(token));
        }

        if self.board.is_full() {
            self.status = GameStatus::Finished;
            self.last_move_time = Utc::now();
            return Ok(MoveOutcome::Draw);
        }

        self.current_turn = token.other();
        self.last_move_time = Utc::now();
        Ok(MoveOutcome::Continue)
    }

    /// Starts the game over on an empty board.
    ///
    /// The previous winner's token moves first. After a draw, or when the
    /// game never finished, red starts.
    pub fn reset(&mut self) {
        self.current_turn = self.winning_token.unwrap_or(Token::Red);
        self.board = Board::new();
        self.status = GameStatus::Active;
        self.winner_id.clear();
        self.winning_token = None;
        self.last_move_time = Utc::now();
    }

    /// Resolves which token `player_id` plays. A hot-seat game holds the same
    /// id in both seats, so the seat whose turn it is gets checked first.
    fn mover_token(&self, player_id: &str) -> Result<Token, GameError> {
        if !self.is_participant(player_id) {
            return Err(GameError::NotParticipant);
        }
        if self.seat(self.current_turn) == player_id {
            Ok(self.current_turn)
        } else {
            Err(GameError::NotYourTurn)
        }
    }
}
