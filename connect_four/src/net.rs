//! Real-time socket protocol.
//!
//! Every frame is a JSON envelope `{"type": ..., "payload": ...}`. Inbound
//! and outbound envelopes are closed enums decoded once at the connection
//! boundary.

/// Envelope types for game and lobby sockets.
pub mod messages;
