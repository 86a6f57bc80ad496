//! # Connect Four
//!
//! A Connect-Four engine for live multiplayer sessions with a built-in
//! computer opponent.
//!
//! ## Architecture
//!
//! State flows through three layers:
//!
//! - **Rules**: a 6x7 board and a move state machine that validates moves in
//!   a fixed order and detects wins and draws. No I/O.
//! - **Bot**: a time-boxed alpha-beta minimax agent that plays whichever
//!   seat holds the reserved `"bot"` id.
//! - **Sessions**: the registry of games and players, matchmaking, the
//!   rematch handshake, and a hub that fans state changes out to every
//!   socket watching a game.
//!
//! ## Core Modules
//!
//! - [`game`]: board, entities and the move state machine
//! - [`bot`]: minimax agent, static evaluation and transposition table
//! - [`session`]: game/player registry and matchmaking
//! - [`hub`]: connection mailboxes, topics and broadcast
//! - [`reset`]: rematch negotiation
//! - [`net`]: socket envelope types
//! - [`service`]: the orchestration layer used by servers
//!
//! ## Example
//!
//! ```
//! use connect_four::{EngineConfig, GameService, GameType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = GameService::new(&EngineConfig::default());
//!     let game = service.create_game(GameType::Online, "alice", Some("bob")).await?;
//!     let game = service.submit_move(&game.id, "alice", 3).await?;
//!     assert_eq!(game.board.empty_count(), 41);
//!     Ok(())
//! }
//! ```

/// Computer opponent.
pub mod bot;

/// Engine configuration.
pub mod config;

/// Board, entities and move rules.
pub mod game;

/// Connection mailboxes and broadcast.
pub mod hub;

/// Socket protocol.
pub mod net;

/// Rematch negotiation.
pub mod reset;

/// Orchestration of sessions, connections and resets.
pub mod service;

/// Game and player registry.
pub mod session;

pub use bot::{Agent, AgentConfig};
pub use config::EngineConfig;
pub use game::{
    Board, Cell, Game, GameError, GameId, GameStatus, GameType, Move, MoveOutcome, Player,
    PlayerId, Token,
    constants::{self, BOARD_HEIGHT, BOARD_WIDTH, BOT_ID},
};
pub use hub::{ConnectionHandle, ConnectionHub, ConnectionInbox, Topic};
pub use net::messages::{ClientMessage, Frame, ServerMessage};
pub use service::GameService;
pub use session::{ErrorKind, MatchOutcome, MatchStatus, SessionError, SessionManager, SessionResult};
