//! Computer opponent integration tests.
//!
//! Full single-player games driven through the service, plus the search
//! guarantees that matter to callers: a legal column within the budget and
//! immediate wins taken regardless of depth.

use connect_four::{
    Agent, AgentConfig, BOT_ID, Board, EngineConfig, GameService, GameStatus, GameType, Token,
};
use serde_json::Value;
use std::time::{Duration, Instant};

fn fast_config() -> EngineConfig {
    EngineConfig {
        agent: AgentConfig {
            time_budget: Duration::from_millis(150),
            early_depth: 4,
            late_depth: 6,
        },
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_single_player_game_runs_to_completion() {
    let service = GameService::new(&fast_config());
    let mut game = service
        .create_game(GameType::Single, "alice", None)
        .await
        .unwrap();
    assert_eq!(game.player2_id, BOT_ID);

    let mut turns = 0;
    while game.status == GameStatus::Active {
        assert_eq!(game.current_turn, Token::Red, "bot always answers before returning");
        let column = game.board.legal_columns().next().unwrap();
        game = service
            .submit_move(&game.id, "alice", column as i64)
            .await
            .unwrap();
        turns += 1;
        assert!(turns <= 21, "a game cannot outlast the board");
    }

    assert_eq!(game.status, GameStatus::Finished);
    let placed = 42 - game.board.empty_count();
    assert!(placed >= 7, "a win needs at least seven tokens on the board");
    if !game.winner_id.is_empty() {
        assert!(game.is_participant(&game.winner_id));
    }
}

#[tokio::test]
async fn test_bot_blocks_vertical_threat() {
    let service = GameService::new(&fast_config());
    let game = service
        .create_game(GameType::Single, "alice", None)
        .await
        .unwrap();

    // Alice stacks column 0; the bot must cap it before the fourth token.
    let mut latest = game;
    for _ in 0..4 {
        if latest.status != GameStatus::Active || latest.board.is_column_full(0) {
            break;
        }
        latest = service.submit_move(&latest.id, "alice", 0).await.unwrap();
    }
    assert_ne!(latest.winner_id, "alice", "vertical threat left open:\n{}", latest.board);
    assert!(!latest.board.has_four(Token::Red));
}

#[tokio::test]
async fn test_reset_after_bot_win_lets_bot_open() {
    let service = GameService::new(&fast_config());
    let mut game = service
        .create_game(GameType::Single, "alice", None)
        .await
        .unwrap();

    // Alice always plays the leftmost open column and loses.
    while game.status == GameStatus::Active {
        let column = game.board.legal_columns().next().unwrap();
        game = service
            .submit_move(&game.id, "alice", column as i64)
            .await
            .unwrap();
    }
    assert_eq!(game.winner_id, BOT_ID, "bot should beat leftmost play:\n{}", game.board);

    let (handle, mut inbox) = service.hub().open();
    service
        .attach_game_connection(&game.id, &handle, Some("alice"))
        .await
        .unwrap();
    inbox.next().await.unwrap();

    let reset = service
        .request_reset(&game.id, "alice")
        .await
        .unwrap()
        .expect("a rematch against the bot is immediate");
    assert_eq!(reset.status, GameStatus::Active);
    assert_eq!(reset.board.empty_count(), 41);
    assert_eq!(reset.current_turn, Token::Red);

    let mut frames = Vec::new();
    while let Ok(Some(frame)) =
        tokio::time::timeout(Duration::from_millis(50), inbox.next()).await
    {
        frames.push(serde_json::from_str::<Value>(&frame).unwrap());
    }
    let types: Vec<&str> = frames.iter().filter_map(|f| f["type"].as_str()).collect();
    assert_eq!(types, vec!["resetGame", "gameState"]);

    let occupied: Vec<&Value> = frames[1]["payload"]["board"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row.as_array().unwrap())
        .filter(|cell| **cell != 0)
        .collect();
    assert_eq!(occupied, vec![&Value::from(2)], "only the bot's opening token");
    assert_eq!(frames[1]["payload"]["currentTurn"], 1);
}

#[tokio::test]
async fn test_bot_opening_move_when_holding_red() {
    let service = GameService::new(&fast_config());
    let game = service
        .create_game(GameType::Single, BOT_ID, Some("alice"))
        .await
        .unwrap();
    assert_eq!(game.current_turn, Token::Yellow);
    assert_eq!(game.board.empty_count(), 41);
}

#[test]
fn test_default_budget_is_respected() {
    let mut agent = Agent::new(BOT_ID.to_string(), Token::Red, AgentConfig::default());
    let board = Board::from_rows([
        ".......",
        ".......",
        ".......",
        "...Y...",
        "..RR...",
        ".YRYY..",
    ])
    .unwrap();

    let started = Instant::now();
    let column = agent.next_move(&board).unwrap();
    let elapsed = started.elapsed();

    assert!(!board.is_column_full(column));
    assert!(
        elapsed < Duration::from_millis(980 + 250),
        "search overran its budget: {elapsed:?}"
    );
}
