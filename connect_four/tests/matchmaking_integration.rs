//! Matchmaking integration tests.
//!
//! Concurrent requests must pair into a single game, and lobby connections
//! must hear about the outcome on their own mailbox.

use connect_four::{EngineConfig, GameService, GameStatus, MatchStatus, ServerMessage};
use std::{sync::Arc, time::Duration};

fn service() -> Arc<GameService> {
    Arc::new(GameService::new(&EngineConfig::default()))
}

async fn next_message(inbox: &mut connect_four::ConnectionInbox) -> ServerMessage {
    let frame = tokio::time::timeout(Duration::from_secs(1), inbox.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed");
    serde_json::from_str(&frame).unwrap()
}

// ============================================================================
// One-shot requests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_concurrent_requests_share_one_game() {
    for _ in 0..50 {
        let service = service();

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.matchmake("alice").await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.matchmake("bob").await }
        });
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_eq!(a.game.id, b.game.id);
        let mut statuses = [a.status, b.status];
        statuses.sort_by_key(|s| *s == MatchStatus::Waiting);
        assert_eq!(statuses, [MatchStatus::Matched, MatchStatus::Waiting]);

        let games = service.sessions().list_games().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].status, GameStatus::Active);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_requesters_pair_off_exactly() {
    let service = service();
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.matchmake(&format!("player{i}")).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let games = service.sessions().list_games().await;
    assert_eq!(games.len(), 10);
    assert!(games.iter().all(|g| g.status == GameStatus::Active));
    assert!(games.iter().all(|g| g.player1_id != g.player2_id));
}

// ============================================================================
// Lobby connections
// ============================================================================

#[tokio::test]
async fn test_lobby_notifies_both_players_on_match() {
    let service = service();

    let (alice, mut alice_inbox) = service.hub().open();
    let (bob, mut bob_inbox) = service.hub().open();
    service.attach_lobby_connection(&alice).await;
    service.attach_lobby_connection(&bob).await;
    assert!(matches!(next_message(&mut alice_inbox).await, ServerMessage::Connected { .. }));
    assert!(matches!(next_message(&mut bob_inbox).await, ServerMessage::Connected { .. }));

    let waiting = service.lobby_join(&alice, "alice").await.unwrap();
    assert_eq!(waiting.status, MatchStatus::Waiting);
    match next_message(&mut alice_inbox).await {
        ServerMessage::GameCreated { game_id, player1_id } => {
            assert_eq!(game_id, waiting.game.id);
            assert_eq!(player1_id, "alice");
        }
        other => panic!("expected gameCreated, got {other:?}"),
    }

    let matched = service.lobby_join(&bob, "bob").await.unwrap();
    assert_eq!(matched.status, MatchStatus::Matched);

    for inbox in [&mut alice_inbox, &mut bob_inbox] {
        match next_message(inbox).await {
            ServerMessage::GameStart {
                game_id,
                player1_id,
                player2_id,
            } => {
                assert_eq!(game_id, waiting.game.id);
                assert_eq!(player1_id, "alice");
                assert_eq!(player2_id, "bob");
            }
            other => panic!("expected gameStart, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_repeat_request_returns_existing_waiting_game() {
    let service = service();
    let first = service.matchmake("alice").await.unwrap();
    let second = service.matchmake("alice").await.unwrap();
    assert_eq!(first.game.id, second.game.id);
    assert_eq!(second.status, MatchStatus::Waiting);
    assert!(service.matchmake("  ").await.is_err());
}
