//! Connect-Four rules.
//!
//! This module provides:
//! - The 6x7 board with gravity drops and four-in-a-row detection
//! - Game and player records shared with the API surface
//! - The move state machine: validation, win/draw detection and reset

pub mod board;
pub mod constants;
pub mod entities;
pub mod state_machine;

pub use board::{Board, Cell, Token};
pub use entities::{Game, GameId, GameStatus, GameType, Move, Player, PlayerId};
pub use state_machine::{GameError, MoveOutcome};
