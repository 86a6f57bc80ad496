//! Authoritative registry of games and players.

use std::{cmp::Reverse, collections::HashMap};
use tokio::sync::RwLock;

use super::{
    errors::{SessionError, SessionResult},
    models::{MatchOutcome, MatchStatus},
};
use crate::{
    bot::{Agent, AgentConfig},
    game::{
        constants::BOT_ID,
        entities::{Game, GameId, GameStatus, GameType, Player, PlayerId},
        state_machine::MoveOutcome,
    },
};

/// Owns every live game and registered player.
///
/// Games and players sit behind separate locks, so leaderboard reads never
/// wait on a move. Callers only ever receive clones; every mutation goes
/// through a method here and happens under the write lock.
pub struct SessionManager {
    games: RwLock<HashMap<GameId, Game>>,
    players: RwLock<HashMap<PlayerId, Player>>,
    agent_config: AgentConfig,
}

impl SessionManager {
    pub fn new(agent_config: AgentConfig) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
            agent_config,
        }
    }

    // === Players ===

    /// Registers a player under a unique, non-blank username.
    pub async fn create_player(&self, username: &str) -> SessionResult<Player> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::InvalidRequest(
                "username is required".to_string(),
            ));
        }

        let mut players = self.players.write().await;
        if players.values().any(|p| p.username == username) {
            return Err(SessionError::UsernameTaken);
        }

        let player = Player::new(username);
        players.insert(player.id.clone(), player.clone());
        log::info!("Registered player {} ({})", player.username, player.id);
        Ok(player)
    }

    pub async fn get_player(&self, player_id: &str) -> SessionResult<Player> {
        self.players
            .read()
            .await
            .get(player_id)
            .cloned()
            .ok_or(SessionError::PlayerNotFound)
    }

    /// All players, oldest registration first.
    pub async fn list_players(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.read().await.values().cloned().collect();
        players.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        players
    }

    /// Players ranked by wins, then fewest losses, then username. A `limit`
    /// of zero returns everyone.
    pub async fn leaderboard(&self, limit: usize) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.read().await.values().cloned().collect();
        players.sort_by(|a, b| {
            Reverse(a.wins)
                .cmp(&Reverse(b.wins))
                .then_with(|| a.losses.cmp(&b.losses))
                .then_with(|| a.username.cmp(&b.username))
        });
        if limit > 0 {
            players.truncate(limit);
        }
        players
    }

    /// Applies the stat hook for a finished game.
    ///
    /// The winner gains a win and the other seat a loss. Draws, hot-seat games
    /// and unknown or bot seats change nothing for the affected side.
    pub async fn record_result(&self, game: &Game) {
        if game.status != GameStatus::Finished || game.winner_id.is_empty() {
            return;
        }
        let Some(loser_id) = game.opponent_of(&game.winner_id) else {
            return;
        };
        if loser_id == game.winner_id {
            return;
        }

        let mut players = self.players.write().await;
        if let Some(winner) = players.get_mut(&game.winner_id) {
            winner.wins += 1;
        }
        if let Some(loser) = players.get_mut(loser_id) {
            loser.losses += 1;
        }
        log::debug!("Recorded result for game {}: {} beat {}", game.id, game.winner_id, loser_id);
    }

    // === Games ===

    /// Creates a game and plays the bot's opening move when it holds red.
    ///
    /// A `single` game without a second player seats the bot there, a `local`
    /// game seats the first player twice, and an `online` game without a
    /// second player waits for one.
    pub async fn create_game(
        &self,
        game_type: GameType,
        player1_id: &str,
        player2_id: Option<&str>,
    ) -> SessionResult<Game> {
        let player1_id = player1_id.trim();
        if player1_id.is_empty() {
            return Err(SessionError::InvalidRequest(
                "player1Id is required".to_string(),
            ));
        }

        let player2_id = match (game_type, player2_id.map(str::trim).unwrap_or_default()) {
            (GameType::Single, "") => BOT_ID.to_string(),
            (GameType::Local, "") => player1_id.to_string(),
            (_, id) => id.to_string(),
        };

        let mut game = Game::new(game_type, player1_id.to_string(), player2_id);
        if !(game_type == GameType::Online && game.player2_id.is_empty()) {
            game.status = GameStatus::Active;
        }
        if game.has_bot() {
            game.attach_agent(self.agent_config);
        }

        let game_id = game.id.clone();
        let bot_opens = game.is_bot_turn();
        log::info!(
            "Created {} game {} ({} vs {})",
            game.game_type,
            game.id,
            game.player1_id,
            if game.player2_id.is_empty() { "<open>" } else { game.player2_id.as_str() }
        );
        self.games.write().await.insert(game_id.clone(), game.clone());

        if bot_opens {
            return self.advance_bot(&game_id).await;
        }
        Ok(game)
    }

    pub async fn get_game(&self, game_id: &str) -> SessionResult<Game> {
        self.games
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or(SessionError::GameNotFound)
    }

    /// All games, oldest first.
    pub async fn list_games(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self.games.read().await.values().cloned().collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        games
    }

    /// Applies one player move. Runs the stat hook if it ended the game.
    ///
    /// Does not let the bot reply; see [`SessionManager::advance_bot`].
    pub async fn submit_move(
        &self,
        game_id: &str,
        player_id: &str,
        column: i64,
    ) -> SessionResult<(Game, MoveOutcome)> {
        let (game, outcome) = {
            let mut games = self.games.write().await;
            let game = games.get_mut(game_id).ok_or(SessionError::GameNotFound)?;
            let outcome = game.apply_move(player_id, column)?;
            (game.clone(), outcome)
        };

        if outcome.is_terminal() {
            self.record_result(&game).await;
        }
        Ok((game, outcome))
    }

    /// Plays the bot's move if it holds the turn, returning the latest game.
    ///
    /// The search runs on the blocking pool against a snapshot, with no lock
    /// held. Its column is applied only if the board still matches the
    /// snapshot and the bot still holds the turn.
    pub async fn advance_bot(&self, game_id: &str) -> SessionResult<Game> {
        let (mut agent, board) = {
            let games = self.games.read().await;
            let game = games.get(game_id).ok_or(SessionError::GameNotFound)?;
            let Some(token) = game.bot_token().filter(|_| game.is_bot_turn()) else {
                return Ok(game.clone());
            };
            let agent = game
                .agent()
                .cloned()
                .unwrap_or_else(|| Agent::new(BOT_ID.to_string(), token, self.agent_config));
            (agent, game.board)
        };

        let column = tokio::task::spawn_blocking(move || agent.next_move(&board))
            .await
            .map_err(|e| SessionError::Internal(format!("bot search failed: {e}")))?;

        let (game, outcome) = {
            let mut games = self.games.write().await;
            let game = games.get_mut(game_id).ok_or(SessionError::GameNotFound)?;

            let Some(column) = column else {
                return Ok(game.clone());
            };
            if game.board != board || !game.is_bot_turn() {
                log::warn!("Discarding stale bot move for game {game_id}");
                return Ok(game.clone());
            }

            let outcome = game.apply_move(BOT_ID, column as i64)?;
            log::debug!("Bot played column {} in game {}", column, game.id);
            (game.clone(), outcome)
        };

        if outcome.is_terminal() {
            self.record_result(&game).await;
        }
        Ok(game)
    }

    /// Clears the board and lets the bot open if it now holds the turn.
    ///
    /// A game still waiting for its second player cannot be reset.
    pub async fn reset_game(&self, game_id: &str) -> SessionResult<Game> {
        let game = {
            let mut games = self.games.write().await;
            let game = games.get_mut(game_id).ok_or(SessionError::GameNotFound)?;
            if game.status == GameStatus::Waiting {
                return Err(SessionError::InvalidRequest(
                    "game has not started".to_string(),
                ));
            }
            game.reset();
            game.clone()
        };

        log::info!("Reset game {} ({} to move)", game.id, game.current_turn);
        if game.is_bot_turn() {
            return self.advance_bot(game_id).await;
        }
        Ok(game)
    }

    /// Seats `player_id` in the open second seat of a waiting game.
    pub async fn join_game(&self, game_id: &str, player_id: &str) -> SessionResult<Game> {
        let player_id = human_player_id(player_id)?;

        let mut games = self.games.write().await;
        let game = games.get_mut(game_id).ok_or(SessionError::GameNotFound)?;

        if game.status != GameStatus::Waiting {
            return Err(SessionError::InvalidRequest(
                "game is not waiting for players".to_string(),
            ));
        }
        if game.player1_id == player_id {
            return Err(SessionError::InvalidRequest(
                "player already joined this game".to_string(),
            ));
        }
        if !game.player2_id.is_empty() {
            return Err(SessionError::InvalidRequest(
                "seat is already taken".to_string(),
            ));
        }

        game.player2_id = player_id.to_string();
        game.status = GameStatus::Active;
        game.last_move_time = chrono::Utc::now();
        log::info!("Player {} joined game {}", player_id, game.id);
        Ok(game.clone())
    }

    /// Pairs `player_id` with the oldest open online game, or opens one.
    ///
    /// The scan, the seat assignment and the insertion happen under one write
    /// lock, so concurrent requesters always end up in the same game. A
    /// player who already has an open game gets it back instead of a second
    /// one.
    pub async fn find_or_create_match(&self, player_id: &str) -> SessionResult<MatchOutcome> {
        let player_id = human_player_id(player_id)?;

        let mut games = self.games.write().await;

        let is_open = |game: &Game| {
            game.game_type == GameType::Online
                && game.status == GameStatus::Waiting
                && game.player2_id.is_empty()
        };

        if let Some(own) = games
            .values()
            .find(|game| is_open(game) && game.player1_id == player_id)
        {
            return Ok(MatchOutcome {
                status: MatchStatus::Waiting,
                game: own.clone(),
            });
        }

        let oldest_open = games
            .values_mut()
            .filter(|game| is_open(game) && game.player1_id != player_id)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        if let Some(game) = oldest_open {
            game.player2_id = player_id.to_string();
            game.status = GameStatus::Active;
            game.last_move_time = chrono::Utc::now();
            log::info!("Matched {} with {} in game {}", game.player1_id, player_id, game.id);
            return Ok(MatchOutcome {
                status: MatchStatus::Matched,
                game: game.clone(),
            });
        }

        let game = Game::new(GameType::Online, player_id.to_string(), String::new());
        games.insert(game.id.clone(), game.clone());
        log::info!("Opened game {} for {} in matchmaking", game.id, player_id);
        Ok(MatchOutcome {
            status: MatchStatus::Waiting,
            game,
        })
    }
}

/// Trims a seat-taking player id, rejecting blanks and the bot's id.
fn human_player_id(player_id: &str) -> SessionResult<&str> {
    let player_id = player_id.trim();
    if player_id.is_empty() {
        return Err(SessionError::InvalidRequest(
            "playerId is required".to_string(),
        ));
    }
    if player_id == BOT_ID {
        return Err(SessionError::InvalidRequest(format!(
            "{BOT_ID} is reserved for the computer player"
        )));
    }
    Ok(player_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{board::Token, state_machine::GameError};
    use std::time::Duration;

    fn manager() -> SessionManager {
        SessionManager::new(AgentConfig {
            time_budget: Duration::from_millis(200),
            early_depth: 3,
            late_depth: 4,
        })
    }

    // ========================================================================
    // Players
    // ========================================================================

    #[tokio::test]
    async fn test_create_player_rejects_blank_and_duplicate_names() {
        let sessions = manager();
        let alice = sessions.create_player("  alice ").await.unwrap();
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.wins, 0);

        assert!(matches!(
            sessions.create_player("alice").await,
            Err(SessionError::UsernameTaken)
        ));
        assert!(matches!(
            sessions.create_player("   ").await,
            Err(SessionError::InvalidRequest(_))
        ));
        assert_eq!(sessions.get_player(&alice.id).await.unwrap(), alice);
        assert!(matches!(
            sessions.get_player("nobody").await,
            Err(SessionError::PlayerNotFound)
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_order_and_limit() {
        let sessions = manager();
        let a = sessions.create_player("a").await.unwrap();
        let b = sessions.create_player("b").await.unwrap();
        let c = sessions.create_player("c").await.unwrap();
        {
            let mut players = sessions.players.write().await;
            players.get_mut(&a.id).unwrap().wins = 1;
            players.get_mut(&a.id).unwrap().losses = 3;
            players.get_mut(&b.id).unwrap().wins = 1;
            players.get_mut(&c.id).unwrap().wins = 5;
        }

        let names: Vec<String> = sessions
            .leaderboard(0)
            .await
            .into_iter()
            .map(|p| p.username)
            .collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        assert_eq!(sessions.leaderboard(2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_win_updates_both_records() {
        let sessions = manager();
        let alice = sessions.create_player("alice").await.unwrap();
        let bob = sessions.create_player("bob").await.unwrap();
        let game = sessions
            .create_game(GameType::Local, &alice.id, Some(&bob.id))
            .await
            .unwrap();

        for _ in 0..3 {
            sessions.submit_move(&game.id, &alice.id, 0).await.unwrap();
            sessions.submit_move(&game.id, &bob.id, 1).await.unwrap();
        }
        let (finished, outcome) = sessions.submit_move(&game.id, &alice.id, 0).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Won(Token::Red));
        assert_eq!(finished.winner_id, alice.id);

        assert_eq!(sessions.get_player(&alice.id).await.unwrap().wins, 1);
        assert_eq!(sessions.get_player(&bob.id).await.unwrap().losses, 1);
    }

    #[tokio::test]
    async fn test_hot_seat_win_records_nothing() {
        let sessions = manager();
        let alice = sessions.create_player("alice").await.unwrap();
        let game = sessions
            .create_game(GameType::Local, &alice.id, None)
            .await
            .unwrap();
        assert_eq!(game.player2_id, alice.id);

        for _ in 0..3 {
            sessions.submit_move(&game.id, &alice.id, 0).await.unwrap();
            sessions.submit_move(&game.id, &alice.id, 1).await.unwrap();
        }
        sessions.submit_move(&game.id, &alice.id, 0).await.unwrap();

        let record = sessions.get_player(&alice.id).await.unwrap();
        assert_eq!((record.wins, record.losses), (0, 0));
    }

    // ========================================================================
    // Games
    // ========================================================================

    #[tokio::test]
    async fn test_create_game_seating() {
        let sessions = manager();

        let single = sessions
            .create_game(GameType::Single, "alice", None)
            .await
            .unwrap();
        assert_eq!(single.player2_id, BOT_ID);
        assert_eq!(single.status, GameStatus::Active);
        assert!(single.agent().is_some());

        let online = sessions
            .create_game(GameType::Online, "alice", Some(""))
            .await
            .unwrap();
        assert_eq!(online.status, GameStatus::Waiting);

        let paired = sessions
            .create_game(GameType::Online, "alice", Some("bob"))
            .await
            .unwrap();
        assert_eq!(paired.status, GameStatus::Active);

        assert!(matches!(
            sessions.create_game(GameType::Local, " ", None).await,
            Err(SessionError::InvalidRequest(_))
        ));
        assert_eq!(sessions.list_games().await.len(), 3);
    }

    #[tokio::test]
    async fn test_bot_in_red_seat_opens() {
        let sessions = manager();
        let game = sessions
            .create_game(GameType::Single, BOT_ID, Some("alice"))
            .await
            .unwrap();
        assert_eq!(game.board.empty_count(), 41);
        assert_eq!(game.current_turn, Token::Yellow);
    }

    #[tokio::test]
    async fn test_advance_bot_replies_once() {
        let sessions = manager();
        let game = sessions
            .create_game(GameType::Single, "alice", None)
            .await
            .unwrap();

        let (after_human, _) = sessions.submit_move(&game.id, "alice", 3).await.unwrap();
        assert!(after_human.is_bot_turn());

        let after_bot = sessions.advance_bot(&game.id).await.unwrap();
        assert_eq!(after_bot.board.empty_count(), 40);
        assert_eq!(after_bot.current_turn, Token::Red);

        let unchanged = sessions.advance_bot(&game.id).await.unwrap();
        assert_eq!(unchanged.board, after_bot.board);
    }

    #[tokio::test]
    async fn test_submit_move_errors() {
        let sessions = manager();
        assert!(matches!(
            sessions.submit_move("missing", "alice", 0).await,
            Err(SessionError::GameNotFound)
        ));

        let game = sessions
            .create_game(GameType::Online, "alice", Some("bob"))
            .await
            .unwrap();
        assert!(matches!(
            sessions.submit_move(&game.id, "bob", 0).await,
            Err(SessionError::Game(GameError::NotYourTurn))
        ));
        assert!(matches!(
            sessions.submit_move(&game.id, "alice", 9).await,
            Err(SessionError::Game(GameError::InvalidColumn))
        ));
    }

    #[tokio::test]
    async fn test_join_game_rules() {
        let sessions = manager();
        let game = sessions
            .create_game(GameType::Online, "alice", None)
            .await
            .unwrap();

        assert!(sessions.join_game(&game.id, "alice").await.is_err());
        let joined = sessions.join_game(&game.id, "bob").await.unwrap();
        assert_eq!(joined.player2_id, "bob");
        assert_eq!(joined.status, GameStatus::Active);
        assert!(sessions.join_game(&game.id, "carol").await.is_err());
    }

    #[tokio::test]
    async fn test_reset_after_win_gives_winner_first_turn() {
        let sessions = manager();
        let game = sessions
            .create_game(GameType::Online, "alice", Some("bob"))
            .await
            .unwrap();

        for (alice, bob) in [(0, 1), (0, 2), (6, 3), (6, 4)] {
            sessions.submit_move(&game.id, "alice", alice).await.unwrap();
            sessions.submit_move(&game.id, "bob", bob).await.unwrap();
        }
        assert_eq!(sessions.get_game(&game.id).await.unwrap().winner_id, "bob");

        let reset = sessions.reset_game(&game.id).await.unwrap();
        assert_eq!(reset.status, GameStatus::Active);
        assert_eq!(reset.current_turn, Token::Yellow);
        assert_eq!(reset.board.empty_count(), 42);
    }

    #[tokio::test]
    async fn test_reset_of_waiting_game_is_rejected() {
        let sessions = manager();
        let open = sessions.find_or_create_match("alice").await.unwrap();

        assert!(matches!(
            sessions.reset_game(&open.game.id).await,
            Err(SessionError::InvalidRequest(_))
        ));

        let unchanged = sessions.get_game(&open.game.id).await.unwrap();
        assert_eq!(unchanged.status, GameStatus::Waiting);
        assert!(unchanged.player2_id.is_empty());

        let matched = sessions.find_or_create_match("bob").await.unwrap();
        assert_eq!(matched.status, MatchStatus::Matched);
        assert_eq!(matched.game.id, open.game.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stale_bot_move_is_discarded() {
        let sessions = std::sync::Arc::new(SessionManager::new(AgentConfig {
            time_budget: Duration::from_millis(1500),
            early_depth: 42,
            late_depth: 42,
        }));
        let game = sessions
            .create_game(GameType::Single, "alice", None)
            .await
            .unwrap();
        sessions.submit_move(&game.id, "alice", 3).await.unwrap();

        let searching = {
            let sessions = sessions.clone();
            let game_id = game.id.clone();
            tokio::spawn(async move { sessions.advance_bot(&game_id).await })
        };

        tokio::time::sleep(Duration::from_millis(300)).await;
        let reset = sessions.reset_game(&game.id).await.unwrap();
        assert_eq!(reset.current_turn, Token::Red);

        let after = searching.await.unwrap().unwrap();
        assert_eq!(after.board.empty_count(), 42);
        assert_eq!(after.current_turn, Token::Red);
        assert_eq!(sessions.get_game(&game.id).await.unwrap().board.empty_count(), 42);
    }

    #[tokio::test]
    async fn test_bot_id_cannot_take_a_seat() {
        let sessions = manager();
        assert!(matches!(
            sessions.find_or_create_match(BOT_ID).await,
            Err(SessionError::InvalidRequest(_))
        ));
        assert!(sessions.list_games().await.is_empty());

        let open = sessions
            .create_game(GameType::Online, "alice", None)
            .await
            .unwrap();
        assert!(matches!(
            sessions.join_game(&open.id, BOT_ID).await,
            Err(SessionError::InvalidRequest(_))
        ));
        assert_eq!(
            sessions.get_game(&open.id).await.unwrap().status,
            GameStatus::Waiting
        );
    }

    // ========================================================================
    // Matchmaking
    // ========================================================================

    #[tokio::test]
    async fn test_matchmaking_pairs_second_requester() {
        let sessions = manager();

        let first = sessions.find_or_create_match("alice").await.unwrap();
        assert_eq!(first.status, MatchStatus::Waiting);

        let again = sessions.find_or_create_match("alice").await.unwrap();
        assert_eq!(again.status, MatchStatus::Waiting);
        assert_eq!(again.game.id, first.game.id);

        let second = sessions.find_or_create_match("bob").await.unwrap();
        assert_eq!(second.status, MatchStatus::Matched);
        assert_eq!(second.game.id, first.game.id);
        assert_eq!(second.game.player1_id, "alice");
        assert_eq!(second.game.player2_id, "bob");
        assert_eq!(second.game.status, GameStatus::Active);
        assert_eq!(sessions.list_games().await.len(), 1);
    }

    #[tokio::test]
    async fn test_matchmaking_ignores_non_online_games() {
        let sessions = manager();
        sessions
            .create_game(GameType::Local, "carol", None)
            .await
            .unwrap();
        let outcome = sessions.find_or_create_match("bob").await.unwrap();
        assert_eq!(outcome.status, MatchStatus::Waiting);
    }
}
