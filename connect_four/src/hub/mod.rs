//! Connection hub.
//!
//! Each socket owns a bounded mailbox. The hub tracks which mailboxes watch
//! which game, which belong to the lobby, and which one currently speaks for
//! each player, and fans envelopes out to them without blocking.

pub mod connection;
pub mod manager;

pub use connection::{ConnectionHandle, ConnectionId, ConnectionInbox};
pub use manager::{ConnectionHub, DEFAULT_MAILBOX_CAPACITY, Topic};
