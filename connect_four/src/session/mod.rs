//! Session registry: games, players, matchmaking and the stat hook.
//!
//! ## Example
//!
//! ```
//! use connect_four::bot::AgentConfig;
//! use connect_four::game::entities::GameType;
//! use connect_four::session::SessionManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sessions = SessionManager::new(AgentConfig::default());
//!     let game = sessions.create_game(GameType::Local, "alice", None).await?;
//!     let (game, _) = sessions.submit_move(&game.id, "alice", 3).await?;
//!     assert_eq!(game.board.empty_count(), 41);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ErrorKind, SessionError, SessionResult};
pub use manager::SessionManager;
pub use models::{DEFAULT_LEADERBOARD_LIMIT, MatchOutcome, MatchStatus};
