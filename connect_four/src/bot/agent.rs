//! Time-boxed minimax opponent.

use std::time::{Duration, Instant};

use super::{
    evaluation::{WIN_SCORE, evaluate},
    memo::{MemoKey, MemoTable},
};
use crate::game::{
    board::{Board, Token},
    constants::{BOARD_CELLS, BOARD_WIDTH},
    entities::PlayerId,
};

/// Columns in the order they are searched. Trying the center first prunes
/// more and makes it win ties, since a later column must score strictly
/// higher to replace it.
const SEARCH_ORDER: [usize; BOARD_WIDTH] = [3, 2, 4, 1, 5, 0, 6];

/// Score reported by a node reached after the deadline.
const NEUTRAL_SCORE: i32 = 0;

/// Search limits for an [`Agent`].
///
/// # Examples
///
/// ```
/// use connect_four::bot::AgentConfig;
/// use std::time::Duration;
///
/// let config = AgentConfig::default();
/// assert_eq!(config.time_budget, Duration::from_millis(980));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AgentConfig {
    /// Wall-clock limit for one move selection.
    pub time_budget: Duration,

    /// Search depth while at least a third of the board is empty.
    pub early_depth: u32,

    /// Search depth once fewer than a third of the cells are empty.
    pub late_depth: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(980),
            early_depth: 7,
            late_depth: 9,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.time_budget.is_zero() {
            return Err("Bot time budget must be greater than zero".to_string());
        }

        if self.early_depth == 0 {
            return Err("Bot search depth must be at least 1".to_string());
        }

        if self.late_depth < self.early_depth {
            return Err("Late-game depth must not be smaller than early-game depth".to_string());
        }

        Ok(())
    }

    /// Depth to search `board` to. Never less than one ply.
    pub fn depth_for(&self, board: &Board) -> u32 {
        let depth = if board.empty_count() < BOARD_CELLS / 3 {
            self.late_depth
        } else {
            self.early_depth
        };
        depth.max(1)
    }
}

/// Computer opponent bound to one seat of a game.
///
/// Each call to [`Agent::next_move`] is independent: the memo table and node
/// counter start empty and the deadline is measured from the call.
#[derive(Clone, Debug)]
pub struct Agent {
    owner_id: PlayerId,
    token: Token,
    config: AgentConfig,
    memo: MemoTable,
    nodes_explored: u64,
    deadline: Instant,
    timed_out: bool,
}

impl Agent {
    pub fn new(owner_id: PlayerId, token: Token, config: AgentConfig) -> Self {
        Self {
            owner_id,
            token,
            config,
            memo: MemoTable::new(),
            nodes_explored: 0,
            deadline: Instant::now(),
            timed_out: false,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Nodes visited by the most recent search.
    pub fn nodes_explored(&self) -> u64 {
        self.nodes_explored
    }

    /// Picks a column for the agent's token, or `None` on a full board.
    ///
    /// An immediately winning column is returned without searching. Otherwise
    /// each legal column is scored with alpha-beta minimax until the time
    /// budget runs out. A column whose search was cut short is ignored, and
    /// if no column finished the leftmost legal column is played.
    pub fn next_move(&mut self, board: &Board) -> Option<usize> {
        let fallback = board.legal_columns().next()?;

        let started = Instant::now();
        self.deadline = started + self.config.time_budget;
        self.nodes_explored = 0;
        self.timed_out = false;
        self.memo.clear();

        if let Some(col) = self.winning_column(board) {
            log::debug!("Bot {} takes immediate win in column {}", self.owner_id, col);
            return Some(col);
        }

        let depth = self.config.depth_for(board);
        let mut alpha = i32::MIN;
        let mut best: Option<usize> = None;

        for col in SEARCH_ORDER {
            let mut child = *board;
            if child.drop_token(col, self.token).is_none() {
                continue;
            }

            let score = self.minimax(&child, depth.saturating_sub(1), alpha, i32::MAX, false);
            if self.timed_out {
                break;
            }

            if best.is_none() || score > alpha {
                alpha = score;
                best = Some(col);
            }
        }

        self.memo.clear();

        log::debug!(
            "Bot {} searched depth {} in {:?}: {} nodes, timed out: {}",
            self.owner_id,
            depth,
            started.elapsed(),
            self.nodes_explored,
            self.timed_out
        );

        Some(best.unwrap_or(fallback))
    }

    fn winning_column(&self, board: &Board) -> Option<usize> {
        SEARCH_ORDER.into_iter().find(|&col| {
            let mut child = *board;
            child
                .drop_token(col, self.token)
                .is_some_and(|row| child.connects_four(row, col, self.token))
        })
    }

    fn minimax(
        &mut self,
        board: &Board,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> i32 {
        if self.timed_out || Instant::now() >= self.deadline {
            self.timed_out = true;
            return NEUTRAL_SCORE;
        }

        self.nodes_explored += 1;

        if board.is_full() {
            return 0;
        }

        if depth == 0 {
            return evaluate(board, self.token);
        }

        let key = MemoKey {
            board: board.key(),
            depth,
            maximizing,
        };
        if let Some(score) = self.memo.probe(&key, alpha, beta) {
            return score;
        }

        let (window_alpha, window_beta) = (alpha, beta);
        let mover = if maximizing { self.token } else { self.token.other() };
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for col in SEARCH_ORDER {
            let mut child = *board;
            let Some(row) = child.drop_token(col, mover) else {
                continue;
            };

            if child.connects_four(row, col, mover) {
                return if maximizing { WIN_SCORE } else { -WIN_SCORE };
            }

            let score = self.minimax(&child, depth - 1, alpha, beta, !maximizing);
            if self.timed_out {
                return NEUTRAL_SCORE;
            }

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }

            if alpha >= beta {
                break;
            }
        }

        self.memo.store(key, best, window_alpha, window_beta);
        best
    }
}
