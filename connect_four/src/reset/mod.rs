//! Rematch negotiation between the two seats of a game.

pub mod negotiator;

pub use negotiator::{ResetNegotiator, ResetState};
