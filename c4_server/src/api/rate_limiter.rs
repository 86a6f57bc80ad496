//! Per-connection rate limiting for inbound socket envelopes.
//!
//! Each connection carries a short burst window and a longer sustained
//! window. A message must fit in both to be processed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::WebSocketConfig;

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use c4_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Returns `true` and records the request if it fits in the window.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Number of requests allowed before the window fills
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }
}

/// Which window rejected a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LimitExceeded {
    Burst,
    Sustained,
}

impl LimitExceeded {
    /// Text sent back to the client in an `error` envelope.
    pub fn client_message(self) -> &'static str {
        match self {
            Self::Burst => "Rate limit exceeded. Please slow down.",
            Self::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Burst and sustained limits for one socket.
#[derive(Debug)]
pub struct MessageLimits {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl MessageLimits {
    pub fn new(burst_per_second: usize, sustained_per_minute: usize) -> Self {
        Self {
            burst: RateLimiter::new(burst_per_second, Duration::from_secs(1)),
            sustained: RateLimiter::new(sustained_per_minute, Duration::from_secs(60)),
        }
    }

    pub fn from_config(config: &WebSocketConfig) -> Self {
        Self::new(config.burst_limit, config.sustained_limit)
    }

    /// Admits one inbound message.
    pub fn admit(&mut self) -> Result<(), LimitExceeded> {
        if !self.burst.check() {
            return Err(LimitExceeded::Burst);
        }
        if !self.sustained.check() {
            return Err(LimitExceeded::Sustained);
        }
        Ok(())
    }
}
