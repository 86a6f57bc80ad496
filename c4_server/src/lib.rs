//! HTTP and WebSocket server for live Connect-Four games.
//!
//! The game rules, bot, registry and broadcast hub live in the
//! [`connect_four`] crate; this crate puts an axum surface in front of them
//! and owns process concerns: configuration, logging and metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
