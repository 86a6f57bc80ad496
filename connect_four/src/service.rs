//! Orchestration of sessions, connections and rematch negotiation.
//!
//! Every state change follows the same order: mutate the registry, let the
//! bot reply if it holds the turn, then broadcast. Broadcasting is best
//! effort and never rolls a stored change back.

use crate::{
    config::EngineConfig,
    game::{
        constants::BOT_ID,
        entities::{Game, GameType},
        state_machine::GameError,
    },
    hub::{ConnectionHandle, ConnectionHub, Topic},
    net::messages::{ClientMessage, ServerMessage},
    reset::ResetNegotiator,
    session::{MatchOutcome, MatchStatus, SessionError, SessionManager, SessionResult},
};

/// Greeting sent as the first envelope on a lobby socket.
pub const LOBBY_WELCOME: &str = "Successfully connected to game server";

/// Entry point used by both the HTTP handlers and the socket loops.
pub struct GameService {
    sessions: SessionManager,
    hub: ConnectionHub,
    resets: ResetNegotiator,
}

impl GameService {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sessions: SessionManager::new(config.agent),
            hub: ConnectionHub::new(config.mailbox_capacity),
            resets: ResetNegotiator::new(config.reset_request_ttl),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    pub fn resets(&self) -> &ResetNegotiator {
        &self.resets
    }

    // === Games ===

    pub async fn create_game(
        &self,
        game_type: GameType,
        player1_id: &str,
        player2_id: Option<&str>,
    ) -> SessionResult<Game> {
        self.sessions
            .create_game(game_type, player1_id, player2_id)
            .await
    }

    /// Applies a player's move, broadcasts it, then lets the bot reply and
    /// broadcasts again. Returns the latest game.
    pub async fn submit_move(
        &self,
        game_id: &str,
        player_id: &str,
        column: i64,
    ) -> SessionResult<Game> {
        let (game, outcome) = self
            .sessions
            .submit_move(game_id, player_id, column)
            .await?;
        self.broadcast_state(&game).await;

        if outcome.is_terminal() || !game.is_bot_turn() {
            return Ok(game);
        }

        let game = self.sessions.advance_bot(game_id).await?;
        self.broadcast_state(&game).await;
        Ok(game)
    }

    /// Resets a game without a handshake. Any pending proposal is dropped.
    pub async fn reset_game(&self, game_id: &str) -> SessionResult<Game> {
        let game = self.sessions.reset_game(game_id).await?;
        self.resets.cancel(game_id).await;

        self.hub
            .publish(&Topic::Game(game.id.clone()), &ServerMessage::ResetGame)
            .await;
        self.broadcast_state(&game).await;
        Ok(game)
    }

    pub async fn join_game(&self, game_id: &str, player_id: &str) -> SessionResult<Game> {
        let game = self.sessions.join_game(game_id, player_id).await?;
        self.broadcast_state(&game).await;
        Ok(game)
    }

    /// One-shot matchmaking. A match is broadcast to the game's sockets.
    pub async fn matchmake(&self, player_id: &str) -> SessionResult<MatchOutcome> {
        let outcome = self.sessions.find_or_create_match(player_id).await?;
        if outcome.status == MatchStatus::Matched {
            self.broadcast_state(&outcome.game).await;
        }
        Ok(outcome)
    }

    /// Publishes the game's current state to every socket watching it.
    pub async fn broadcast_state(&self, game: &Game) -> usize {
        self.hub
            .publish(
                &Topic::Game(game.id.clone()),
                &ServerMessage::GameState(game.clone()),
            )
            .await
    }

    // === Rematch handshake ===

    /// Proposes a rematch on behalf of `player_id`.
    ///
    /// Against the bot, or in a hot-seat game, the rematch happens at once
    /// and the reset game is returned. Otherwise the proposal is delivered to
    /// the opponent's own connection only and `None` is returned.
    pub async fn request_reset(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> SessionResult<Option<Game>> {
        let game = self.sessions.get_game(game_id).await?;
        let opponent = game
            .opponent_of(player_id)
            .ok_or(SessionError::Game(GameError::NotParticipant))?
            .to_string();

        if opponent == BOT_ID || opponent == player_id {
            return self.reset_game(game_id).await.map(Some);
        }

        if !self.hub.is_player_connected(&opponent).await {
            return Err(SessionError::OpponentNotConnected);
        }

        self.resets.request(game_id, player_id, &opponent).await;
        let request = ServerMessage::ResetRequest {
            requesting_player_id: player_id.to_string(),
        };
        if !self.hub.send_to_player(&opponent, &request).await {
            self.resets.cancel(game_id).await;
            return Err(SessionError::OpponentNotConnected);
        }

        log::info!("Player {player_id} requested a reset of game {game_id}");
        Ok(None)
    }

    /// Answers a pending proposal. Returns the reset game on acceptance.
    pub async fn confirm_reset(
        &self,
        game_id: &str,
        player_id: &str,
        confirm: bool,
    ) -> SessionResult<Option<Game>> {
        let game = self.sessions.get_game(game_id).await?;
        if !game.is_participant(player_id) {
            return Err(GameError::NotParticipant.into());
        }

        self.resets.take_confirmation(game_id, player_id).await?;

        if confirm {
            return self.reset_game(game_id).await.map(Some);
        }

        log::info!("Player {player_id} rejected the reset of game {game_id}");
        self.hub
            .publish(
                &Topic::Game(game.id.clone()),
                &ServerMessage::ResetRejected {
                    rejecting_player_id: player_id.to_string(),
                },
            )
            .await;
        Ok(None)
    }

    // === Sockets ===

    /// Subscribes a game socket and broadcasts the current state to every
    /// watcher. `player_id`, if it names a seat holder, also binds the
    /// socket as that player's directed connection.
    pub async fn attach_game_connection(
        &self,
        game_id: &str,
        handle: &ConnectionHandle,
        player_id: Option<&str>,
    ) -> SessionResult<Game> {
        let game = self.sessions.get_game(game_id).await?;
        self.hub
            .subscribe(Topic::Game(game.id.clone()), handle)
            .await;
        if let Some(player_id) = player_id.filter(|id| game.is_participant(id)) {
            self.hub.bind_player(player_id, handle).await;
        }

        log::info!("Connection {} attached to game {}", handle.id(), game_id);
        self.broadcast_state(&game).await;
        Ok(game)
    }

    /// Subscribes a lobby socket and greets it.
    pub async fn attach_lobby_connection(&self, handle: &ConnectionHandle) {
        self.hub.subscribe(Topic::Lobby, handle).await;
        handle.send(&ServerMessage::Connected {
            message: LOBBY_WELCOME.to_string(),
        });
    }

    /// Removes a socket from every topic and player slot.
    pub async fn detach(&self, handle: &ConnectionHandle) {
        self.hub.disconnect(handle).await;
    }

    /// Dispatches one decoded envelope from a game socket.
    ///
    /// Returns the game if the envelope changed it.
    pub async fn handle_game_message(
        &self,
        game_id: &str,
        handle: &ConnectionHandle,
        message: ClientMessage,
    ) -> SessionResult<Option<Game>> {
        self.bind_if_participant(game_id, handle, message.player_id())
            .await?;

        match message {
            ClientMessage::Move { player_id, column } => self
                .submit_move(game_id, &player_id, column)
                .await
                .map(Some),
            ClientMessage::JoinGame { player_id } => {
                let game = self.join_game(game_id, &player_id).await?;
                self.hub.bind_player(&player_id, handle).await;
                Ok(Some(game))
            }
            ClientMessage::ResetRequest { player_id } => {
                self.request_reset(game_id, &player_id).await
            }
            ClientMessage::ResetConfirm { player_id, confirm } => {
                self.confirm_reset(game_id, &player_id, confirm).await
            }
        }
    }

    /// Dispatches one decoded envelope from a lobby socket. Only `joinGame`
    /// is understood there.
    pub async fn handle_lobby_message(
        &self,
        handle: &ConnectionHandle,
        message: ClientMessage,
    ) -> SessionResult<MatchOutcome> {
        match message {
            ClientMessage::JoinGame { player_id } => self.lobby_join(handle, &player_id).await,
            other => Err(SessionError::InvalidRequest(format!(
                "{other} is not supported on the lobby connection"
            ))),
        }
    }

    /// Runs matchmaking for a lobby socket.
    ///
    /// On a match both players' own connections get `gameStart`. Otherwise
    /// the requester gets `gameCreated`.
    pub async fn lobby_join(
        &self,
        handle: &ConnectionHandle,
        player_id: &str,
    ) -> SessionResult<MatchOutcome> {
        let player_id = player_id.trim();
        self.hub.bind_player(player_id, handle).await;

        let outcome = self.matchmake(player_id).await?;
        let game = &outcome.game;

        match outcome.status {
            MatchStatus::Matched => {
                let start = ServerMessage::GameStart {
                    game_id: game.id.clone(),
                    player1_id: game.player1_id.clone(),
                    player2_id: game.player2_id.clone(),
                };
                for seat in [&game.player1_id, &game.player2_id] {
                    if !self.hub.send_to_player(seat, &start).await {
                        log::warn!("Could not deliver gameStart for {} to {}", game.id, seat);
                    }
                }
            }
            MatchStatus::Waiting => {
                let created = ServerMessage::GameCreated {
                    game_id: game.id.clone(),
                    player1_id: game.player1_id.clone(),
                };
                self.hub.send_to_player(player_id, &created).await;
            }
        }

        Ok(outcome)
    }

    async fn bind_if_participant(
        &self,
        game_id: &str,
        handle: &ConnectionHandle,
        player_id: &str,
    ) -> SessionResult<()> {
        let game = self.sessions.get_game(game_id).await?;
        if game.is_participant(player_id) {
            self.hub.bind_player(player_id, handle).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::GameStatus;

    fn service() -> GameService {
        GameService::new(&EngineConfig::default())
    }

    #[tokio::test]
    async fn test_attach_broadcasts_current_state() {
        let service = service();
        let game = service
            .create_game(GameType::Local, "alice", None)
            .await
            .unwrap();

        let (handle, mut inbox) = service.hub().open();
        service
            .attach_game_connection(&game.id, &handle, Some("alice"))
            .await
            .unwrap();

        let frame = inbox.next().await.unwrap();
        assert!(frame.contains("\"gameState\""));
        assert!(service.hub().is_player_connected("alice").await);
    }

    #[tokio::test]
    async fn test_attach_unknown_game_fails() {
        let service = service();
        let (handle, _inbox) = service.hub().open();
        assert!(matches!(
            service.attach_game_connection("nope", &handle, None).await,
            Err(SessionError::GameNotFound)
        ));
    }

    #[tokio::test]
    async fn test_lobby_rejects_other_envelopes() {
        let service = service();
        let (handle, mut inbox) = service.hub().open();
        service.attach_lobby_connection(&handle).await;
        assert!(inbox.next().await.unwrap().contains(LOBBY_WELCOME));

        let result = service
            .handle_lobby_message(
                &handle,
                ClientMessage::Move {
                    player_id: "alice".into(),
                    column: 0,
                },
            )
            .await;
        assert!(matches!(result, Err(SessionError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_reset_request_without_opponent_connection() {
        let service = service();
        let game = service
            .create_game(GameType::Online, "alice", Some("bob"))
            .await
            .unwrap();
        assert!(matches!(
            service.request_reset(&game.id, "alice").await,
            Err(SessionError::OpponentNotConnected)
        ));
        assert!(matches!(
            service.request_reset(&game.id, "mallory").await,
            Err(SessionError::Game(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_against_bot_is_immediate() {
        let service = service();
        let game = service
            .create_game(GameType::Single, "alice", None)
            .await
            .unwrap();
        let played = service.submit_move(&game.id, "alice", 3).await.unwrap();
        assert_eq!(played.board.empty_count(), 40);

        let reset = service.request_reset(&game.id, "alice").await.unwrap().unwrap();
        assert_eq!(reset.board.empty_count(), 42);
        assert_eq!(reset.status, GameStatus::Active);
    }
}
