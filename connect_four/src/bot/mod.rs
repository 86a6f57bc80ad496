//! Computer opponent.
//!
//! - [`Agent`]: alpha-beta minimax bound to one seat, with a wall-clock budget
//! - [`evaluation`]: static scoring of 4-cell windows plus a center bonus
//! - [`memo`]: transposition table that lives for a single move selection
//!
//! ## Example
//!
//! ```
//! use connect_four::bot::{Agent, AgentConfig};
//! use connect_four::game::board::{Board, Token};
//!
//! let mut agent = Agent::new("bot".to_string(), Token::Yellow, AgentConfig::default());
//! let column = agent.next_move(&Board::new()).unwrap();
//! assert!(column < 7);
//! ```

pub mod agent;
pub mod evaluation;
pub mod memo;

pub use agent::{Agent, AgentConfig};
