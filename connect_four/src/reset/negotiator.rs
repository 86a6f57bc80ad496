//! Two-party rematch handshake.

use std::{collections::HashMap, time::Duration};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    game::entities::{GameId, PlayerId},
    session::{SessionError, SessionResult},
};

/// Handshake state of one game.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResetState {
    Idle,
    Requested {
        requester: PlayerId,
        responder: PlayerId,
    },
}

#[derive(Clone, Debug)]
struct PendingReset {
    requester: PlayerId,
    responder: PlayerId,
    requested_at: Instant,
}

/// Pending rematch proposals, at most one per game.
///
/// A proposal lives until its responder answers, a newer proposal replaces
/// it, or the optional TTL passes. Expiry is checked whenever the game's
/// proposal is looked at.
pub struct ResetNegotiator {
    pending: Mutex<HashMap<GameId, PendingReset>>,
    ttl: Option<Duration>,
}

impl ResetNegotiator {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Records a proposal from `requester` that `responder` must answer.
    pub async fn request(&self, game_id: &str, requester: &str, responder: &str) {
        let mut pending = self.pending.lock().await;
        let replaced = pending.insert(
            game_id.to_string(),
            PendingReset {
                requester: requester.to_string(),
                responder: responder.to_string(),
                requested_at: Instant::now(),
            },
        );
        if replaced.is_some() {
            log::debug!("Reset request for game {game_id} replaced an earlier one");
        }
    }

    /// Consumes the proposal if `responder` is the participant it was sent
    /// to. Returns the requester's id.
    pub async fn take_confirmation(
        &self,
        game_id: &str,
        responder: &str,
    ) -> SessionResult<PlayerId> {
        let mut pending = self.pending.lock().await;
        self.expire(&mut pending, game_id);

        match pending.get(game_id) {
            Some(reset) if reset.responder == responder && reset.requester != responder => {}
            _ => return Err(SessionError::NoPendingReset),
        }

        pending
            .remove(game_id)
            .map(|reset| reset.requester)
            .ok_or(SessionError::NoPendingReset)
    }

    /// Drops any proposal for `game_id`.
    pub async fn cancel(&self, game_id: &str) {
        self.pending.lock().await.remove(game_id);
    }

    pub async fn state(&self, game_id: &str) -> ResetState {
        let mut pending = self.pending.lock().await;
        self.expire(&mut pending, game_id);
        match pending.get(game_id) {
            Some(reset) => ResetState::Requested {
                requester: reset.requester.clone(),
                responder: reset.responder.clone(),
            },
            None => ResetState::Idle,
        }
    }

    fn expire(&self, pending: &mut HashMap<GameId, PendingReset>, game_id: &str) {
        let Some(ttl) = self.ttl else {
            return;
        };
        if pending
            .get(game_id)
            .is_some_and(|reset| reset.requested_at.elapsed() >= ttl)
        {
            pending.remove(game_id);
            log::info!("Reset request for game {game_id} expired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_responder_can_confirm() {
        let resets = ResetNegotiator::new(None);
        resets.request("g", "alice", "bob").await;
        assert_eq!(
            resets.state("g").await,
            ResetState::Requested {
                requester: "alice".into(),
                responder: "bob".into()
            }
        );

        assert!(resets.take_confirmation("g", "alice").await.is_err());
        assert!(resets.take_confirmation("g", "carol").await.is_err());
        assert_eq!(resets.take_confirmation("g", "bob").await.unwrap(), "alice");
        assert_eq!(resets.state("g").await, ResetState::Idle);
        assert!(resets.take_confirmation("g", "bob").await.is_err());
    }

    #[tokio::test]
    async fn test_newer_request_replaces_older() {
        let resets = ResetNegotiator::new(None);
        resets.request("g", "alice", "bob").await;
        resets.request("g", "bob", "alice").await;
        assert!(resets.take_confirmation("g", "bob").await.is_err());
        assert_eq!(resets.take_confirmation("g", "alice").await.unwrap(), "bob");
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_expires_after_ttl() {
        let resets = ResetNegotiator::new(Some(Duration::from_secs(120)));
        resets.request("g", "alice", "bob").await;

        tokio::time::advance(Duration::from_secs(119)).await;
        assert_ne!(resets.state("g").await, ResetState::Idle);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            resets.take_confirmation("g", "bob").await,
            Err(SessionError::NoPendingReset)
        ));
    }

    #[tokio::test]
    async fn test_cancel() {
        let resets = ResetNegotiator::new(None);
        resets.request("g", "alice", "bob").await;
        resets.cancel("g").await;
        assert_eq!(resets.state("g").await, ResetState::Idle);
    }
}
