//! Static position scoring used at the search horizon.

use std::sync::LazyLock;

use crate::game::{
    board::{Board, Cell, Token},
    constants::{BOARD_HEIGHT, BOARD_WIDTH, CENTER_COLUMN, CONNECT},
};

// === Window Scores ===

/// Four of the agent's tokens in one window. Also returned by the search for
/// a simulated win.
pub const WIN_SCORE: i32 = 1_000_000;

/// Three own tokens and one empty cell.
const THREE_SCORE: i32 = 1_000;

/// Two own tokens and two empty cells.
const TWO_SCORE: i32 = 10;

/// One own token and three empty cells.
const ONE_SCORE: i32 = 1;

/// Opponent three-with-a-gap. Weighted double so blocking beats building.
const OPPONENT_THREE_PENALTY: i32 = 2 * THREE_SCORE;

/// Opponent two-with-two-gaps.
const OPPONENT_TWO_PENALTY: i32 = TWO_SCORE;

/// Bonus per own token in the center column.
const CENTER_WEIGHT: i32 = 3;

type Window = [(usize, usize); CONNECT];

/// Every run of four cells on the board, on all four axes.
static WINDOWS: LazyLock<Vec<Window>> = LazyLock::new(|| {
    let mut windows = Vec::new();
    let steps: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];
    for row in 0..BOARD_HEIGHT as isize {
        for col in 0..BOARD_WIDTH as isize {
            for (dr, dc) in steps {
                let end_row = row + dr * (CONNECT as isize - 1);
                let end_col = col + dc * (CONNECT as isize - 1);
                if !(0..BOARD_HEIGHT as isize).contains(&end_row)
                    || !(0..BOARD_WIDTH as isize).contains(&end_col)
                {
                    continue;
                }
                let mut window = [(0, 0); CONNECT];
                for (i, slot) in window.iter_mut().enumerate() {
                    let i = i as isize;
                    *slot = ((row + dr * i) as usize, (col + dc * i) as usize);
                }
                windows.push(window);
            }
        }
    }
    windows
});

/// Scores `board` from `own`'s point of view. Positive favours `own`.
pub fn evaluate(board: &Board, own: Token) -> i32 {
    let mut score = WINDOWS
        .iter()
        .map(|window| score_window(board, window, own))
        .sum::<i32>();
    score += CENTER_WEIGHT * board.column_count(CENTER_COLUMN, own) as i32;
    score
}

fn score_window(board: &Board, window: &Window, own: Token) -> i32 {
    let (mut mine, mut theirs, mut empty) = (0, 0, 0);
    for &(row, col) in window {
        match board.get(row, col) {
            Cell::Empty => empty += 1,
            Cell::Occupied(token) if token == own => mine += 1,
            Cell::Occupied(_) => theirs += 1,
        }
    }

    match (mine, theirs, empty) {
        (4, _, _) => WIN_SCORE,
        (3, _, 1) => THREE_SCORE,
        (2, _, 2) => TWO_SCORE,
        (1, _, 3) => ONE_SCORE,
        (_, 3, 1) => -OPPONENT_THREE_PENALTY,
        (_, 2, 2) => -OPPONENT_TWO_PENALTY,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_count() {
        // 24 horizontal, 21 vertical, 12 per diagonal direction.
        assert_eq!(WINDOWS.len(), 69);
    }

    #[test]
    fn test_empty_board_is_neutral() {
        assert_eq!(evaluate(&Board::new(), Token::Red), 0);
    }

    #[test]
    fn test_center_token_scores_higher_than_edge() {
        let mut center = Board::new();
        center.drop_token(CENTER_COLUMN, Token::Red);
        let mut edge = Board::new();
        edge.drop_token(0, Token::Red);
        assert!(evaluate(&center, Token::Red) > evaluate(&edge, Token::Red));
    }

    #[test]
    fn test_opponent_three_outweighs_own_three() {
        let board = Board::from_rows([
            ".......",
            ".......",
            ".......",
            ".......",
            ".......",
            "YYY.RRR",
        ])
        .unwrap();
        // Each side has one open three on the bottom row, the penalty wins.
        assert!(evaluate(&board, Token::Red) < 0);
        assert!(evaluate(&board, Token::Yellow) < 0);
    }

    #[test]
    fn test_scores_are_symmetric_in_sign_for_lone_threat() {
        let board = Board::from_rows([
            ".......",
            ".......",
            ".......",
            "R......",
            "R......",
            "R......",
        ])
        .unwrap();
        assert!(evaluate(&board, Token::Red) > 0);
        assert!(evaluate(&board, Token::Yellow) < 0);
    }
}
