//! Session error types.

use thiserror::Error;

use crate::game::state_machine::GameError;

/// How an error should be reported to a client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Caused by the request itself.
    Validation,
    /// The referenced game or player does not exist.
    NotFound,
    /// A server-side failure.
    Internal,
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Game not found
    #[error("game not found")]
    GameNotFound,

    /// Player not found
    #[error("player not found")]
    PlayerNotFound,

    /// Username already exists
    #[error("username already taken")]
    UsernameTaken,

    /// Missing or malformed request field
    #[error("{0}")]
    InvalidRequest(String),

    /// Move or state transition rejected by the rules
    #[error(transparent)]
    Game(#[from] GameError),

    /// The other participant has no live connection to receive a rematch
    /// proposal
    #[error("opponent is not connected")]
    OpponentNotConnected,

    /// Confirmation without a matching, unexpired proposal
    #[error("no pending reset request")]
    NoPendingReset,

    /// Background task or encoding failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GameNotFound | Self::PlayerNotFound => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }

    /// Get a client-safe error message
    ///
    /// Internal errors are replaced with a generic message so task or
    /// encoding details never reach a client.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(SessionError::GameNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(SessionError::UsernameTaken.kind(), ErrorKind::Validation);
        assert_eq!(
            SessionError::from(GameError::ColumnFull).kind(),
            ErrorKind::Validation
        );
        assert_eq!(SessionError::Internal("boom".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_client_message_hides_internal_details() {
        let err = SessionError::Internal("join error: task panicked".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(
            SessionError::from(GameError::NotYourTurn).client_message(),
            "not your turn"
        );
    }
}
