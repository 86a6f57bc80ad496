//! Per-search transposition table.
//!
//! Entries are keyed by board, remaining depth and side to move, so a score
//! computed for one search horizon is never reused at another. Alpha-beta
//! scores are usually bounds rather than exact values; each entry records
//! which, and a probe only answers when the stored bound settles the current
//! window.

use std::collections::HashMap;

use crate::game::board::BoardKey;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MemoKey {
    pub board: BoardKey,
    pub depth: u32,
    pub maximizing: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bound {
    /// The true minimax value.
    Exact,
    /// The true value is at least the stored score (fail-high).
    Lower,
    /// The true value is at most the stored score (fail-low).
    Upper,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct MemoEntry {
    score: i32,
    bound: Bound,
}

#[derive(Clone, Debug, Default)]
pub struct MemoTable {
    entries: HashMap<MemoKey, MemoEntry>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a score usable for the window `(alpha, beta)`, if any.
    pub fn probe(&self, key: &MemoKey, alpha: i32, beta: i32) -> Option<i32> {
        let entry = self.entries.get(key)?;
        match entry.bound {
            Bound::Exact => Some(entry.score),
            Bound::Lower if entry.score >= beta => Some(entry.score),
            Bound::Upper if entry.score <= alpha => Some(entry.score),
            _ => None,
        }
    }

    /// Records `score` searched with the original window `(alpha, beta)`.
    pub fn store(&mut self, key: MemoKey, score: i32, alpha: i32, beta: i32) {
        let bound = if score <= alpha {
            Bound::Upper
        } else if score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.entries.insert(key, MemoEntry { score, bound });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Board;

    fn key(depth: u32, maximizing: bool) -> MemoKey {
        MemoKey {
            board: Board::new().key(),
            depth,
            maximizing,
        }
    }

    #[test]
    fn test_exact_entry_always_answers() {
        let mut memo = MemoTable::new();
        memo.store(key(3, true), 5, 0, 10);
        assert_eq!(memo.probe(&key(3, true), -100, 100), Some(5));
    }

    #[test]
    fn test_depth_and_side_are_part_of_key() {
        let mut memo = MemoTable::new();
        memo.store(key(3, true), 5, 0, 10);
        assert_eq!(memo.probe(&key(2, true), 0, 10), None);
        assert_eq!(memo.probe(&key(3, false), 0, 10), None);
    }

    #[test]
    fn test_bounds_only_answer_when_they_cut() {
        let mut memo = MemoTable::new();

        memo.store(key(1, true), 50, 0, 40);
        assert_eq!(memo.probe(&key(1, true), 0, 40), Some(50));
        assert_eq!(memo.probe(&key(1, true), 0, 60), None);

        memo.store(key(2, false), -5, 0, 40);
        assert_eq!(memo.probe(&key(2, false), 0, 40), Some(-5));
        assert_eq!(memo.probe(&key(2, false), -10, 40), None);
    }

    #[test]
    fn test_clear() {
        let mut memo = MemoTable::new();
        memo.store(key(1, true), 1, 0, 10);
        assert_eq!(memo.len(), 1);
        memo.clear();
        assert!(memo.is_empty());
    }
}
