//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use connect_four::{AgentConfig, EngineConfig};
use std::{net::SocketAddr, time::Duration};

/// Default listen address when neither `--bind` nor `SERVER_BIND` is given.
pub const DEFAULT_BIND: &str = "127.0.0.1:9000";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; the exporter is off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Bot search limits
    pub bot: BotConfig,
    /// Lifetime of an unanswered rematch proposal; `None` never expires
    pub reset_request_ttl: Option<Duration>,
    /// WebSocket connection limits
    pub websocket: WebSocketConfig,
}

/// Bot search configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub time_budget_ms: u64,
    pub early_depth: u32,
    pub late_depth: u32,
}

/// Per-connection WebSocket configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Close the connection when nothing arrives for this long
    pub idle_timeout: Duration,
    /// Interval between server pings
    pub ping_interval: Duration,
    /// Frames that may be queued for one connection
    pub mailbox_capacity: usize,
    /// Messages allowed per second
    pub burst_limit: usize,
    /// Messages allowed per minute
    pub sustained_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let agent = AgentConfig::default();
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            metrics_bind: None,
            bot: BotConfig {
                time_budget_ms: agent.time_budget.as_millis() as u64,
                early_depth: agent.early_depth,
                late_depth: agent.late_depth,
            },
            reset_request_ttl: Some(Duration::from_secs(120)),
            websocket: WebSocketConfig {
                idle_timeout: Duration::from_secs(120),
                ping_interval: Duration::from_secs(60),
                mailbox_capacity: 64,
                burst_limit: 10,
                sustained_limit: 100,
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_bind_override` - Optional exporter address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if an address variable is present but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(addr) => addr,
            None => parse_addr("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 9000))),
        };

        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_addr("METRICS_BIND")?,
        };

        let defaults = Self::default();

        let bot = BotConfig {
            time_budget_ms: parse_env_or("BOT_TIME_BUDGET_MS", defaults.bot.time_budget_ms),
            early_depth: parse_env_or("BOT_EARLY_DEPTH", defaults.bot.early_depth),
            late_depth: parse_env_or("BOT_LATE_DEPTH", defaults.bot.late_depth),
        };

        // Zero disables expiry
        let reset_ttl_secs: u64 = parse_env_or("RESET_REQUEST_TTL_SECS", 120);
        let reset_request_ttl = (reset_ttl_secs > 0).then(|| Duration::from_secs(reset_ttl_secs));

        let websocket = WebSocketConfig {
            idle_timeout: Duration::from_secs(parse_env_or("WS_IDLE_TIMEOUT_SECS", 120)),
            ping_interval: Duration::from_secs(parse_env_or("WS_PING_INTERVAL_SECS", 60)),
            mailbox_capacity: parse_env_or("WS_MAILBOX_CAPACITY", 64),
            burst_limit: parse_env_or("WS_BURST_LIMIT", 10),
            sustained_limit: parse_env_or("WS_SUSTAINED_LIMIT", 100),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            bot,
            reset_request_ttl,
            websocket,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.time_budget_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "BOT_TIME_BUDGET_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.bot.early_depth == 0 {
            return Err(ConfigError::Invalid {
                var: "BOT_EARLY_DEPTH".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.bot.late_depth < self.bot.early_depth {
            return Err(ConfigError::Invalid {
                var: "BOT_LATE_DEPTH".to_string(),
                reason: format!(
                    "Must be at least the early depth ({})",
                    self.bot.early_depth
                ),
            });
        }

        if self.websocket.ping_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "WS_PING_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.websocket.ping_interval >= self.websocket.idle_timeout {
            return Err(ConfigError::Invalid {
                var: "WS_PING_INTERVAL_SECS".to_string(),
                reason: format!(
                    "Must be shorter than the idle timeout ({}s)",
                    self.websocket.idle_timeout.as_secs()
                ),
            });
        }

        if self.websocket.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_MAILBOX_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.websocket.burst_limit == 0 || self.websocket.sustained_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_BURST_LIMIT / WS_SUSTAINED_LIMIT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Engine knobs handed to [`connect_four::GameService`].
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            agent: AgentConfig {
                time_budget: Duration::from_millis(self.bot.time_budget_ms),
                early_depth: self.bot.early_depth,
                late_depth: self.bot.late_depth,
            },
            reset_request_ttl: self.reset_request_ttl,
            mailbox_capacity: self.websocket.mailbox_capacity,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// A socket address variable that is optional but must parse when present.
fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: format!("'{value}' is not an IP:PORT address"),
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "BOT_LATE_DEPTH".to_string(),
            reason: "Must be at least the early depth (7)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BOT_LATE_DEPTH"));
        assert!(msg.contains("early depth"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_config_validation_zero_budget() {
        let mut config = ServerConfig::default();
        config.bot.time_budget_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BOT_TIME_BUDGET_MS"));
    }

    #[test]
    fn test_config_validation_late_depth_too_small() {
        let mut config = ServerConfig::default();
        config.bot.early_depth = 8;
        config.bot.late_depth = 4;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BOT_LATE_DEPTH"));
    }

    #[test]
    fn test_config_validation_ping_not_shorter_than_idle() {
        let mut config = ServerConfig::default();
        config.websocket.ping_interval = Duration::from_secs(120);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "WS_PING_INTERVAL_SECS"));
    }

    #[test]
    fn test_config_validation_zero_mailbox() {
        let mut config = ServerConfig::default();
        config.websocket.mailbox_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_config_carries_ttl() {
        let mut config = ServerConfig::default();
        config.reset_request_ttl = None;
        config.bot.time_budget_ms = 250;

        let engine = config.engine_config();
        assert_eq!(engine.reset_request_ttl, None);
        assert_eq!(engine.agent.time_budget, Duration::from_millis(250));
        assert!(engine.validate().is_ok());
    }
}
