//! Engine-side configuration.

use std::time::Duration;

use crate::{bot::AgentConfig, hub::DEFAULT_MAILBOX_CAPACITY};

/// Default lifetime of an unanswered rematch proposal.
pub const DEFAULT_RESET_REQUEST_TTL: Duration = Duration::from_secs(120);

/// Knobs for [`crate::GameService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Search limits for every bot seat.
    pub agent: AgentConfig,

    /// How long a rematch proposal waits for an answer. `None` keeps it
    /// until answered or replaced.
    pub reset_request_ttl: Option<Duration>,

    /// Frames a connection may have queued before it is treated as dead.
    pub mailbox_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            reset_request_ttl: Some(DEFAULT_RESET_REQUEST_TTL),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.agent.validate()?;

        if self.reset_request_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err("Reset request TTL must be greater than zero when set".to_string());
        }

        if self.mailbox_capacity == 0 {
            return Err("Mailbox capacity must be at least 1".to_string());
        }

        Ok(())
    }
}
