//! Fixed-size drop-token grid.
//!
//! Row 0 is the top of the board and row `BOARD_HEIGHT - 1` the bottom, so a
//! token dropped into a column lands on the highest row index that is still
//! empty. On the wire the board is a `6 x 7` matrix of integers where `0` is
//! empty, `1` is red and `2` is yellow.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{BOARD_CELLS, BOARD_HEIGHT, BOARD_WIDTH, CONNECT};

/// One of the two player marks.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Token {
    /// Always owned by the first seat. Moves first on a fresh board.
    Red,
    /// Always owned by the second seat.
    Yellow,
}

impl Token {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Red => Self::Yellow,
            Self::Yellow => Self::Red,
        }
    }
}

impl From<Token> for u8 {
    fn from(token: Token) -> Self {
        match token {
            Token::Red => 1,
            Token::Yellow => 2,
        }
    }
}

impl TryFrom<u8> for Token {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Red),
            2 => Ok(Self::Yellow),
            other => Err(format!("{other} is not a token")),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Yellow => write!(f, "yellow"),
        }
    }
}

/// Contents of a single board cell.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Token),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

impl From<Token> for Cell {
    fn from(token: Token) -> Self {
        Self::Occupied(token)
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => 0,
            Cell::Occupied(token) => token.into(),
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            other => Token::try_from(other).map(Self::Occupied),
        }
    }
}

/// Canonical serialization of a board: one byte per cell, row-major.
pub type BoardKey = [u8; BOARD_CELLS];

/// The four line directions as (row delta, column delta). Each axis is also
/// walked in the opposite direction.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 1), (1, 1)];

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from text rows, top row first. `.` is empty, `R` red
    /// and `Y` yellow; whitespace is ignored. Gravity is not checked, so
    /// floating tokens are accepted.
    pub fn from_rows(rows: [&str; BOARD_HEIGHT]) -> Result<Self, String> {
        let mut board = Self::new();
        for (row, line) in rows.iter().enumerate() {
            let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if marks.len() != BOARD_WIDTH {
                return Err(format!(
                    "row {row} has {} cells, expected {BOARD_WIDTH}",
                    marks.len()
                ));
            }
            for (col, mark) in marks.into_iter().enumerate() {
                board.cells[row][col] = match mark {
                    '.' => Cell::Empty,
                    'R' => Cell::Occupied(Token::Red),
                    'Y' => Cell::Occupied(Token::Yellow),
                    other => return Err(format!("unexpected mark '{other}' in row {row}")),
                };
            }
        }
        Ok(board)
    }

    /// Panics if `row` or `col` is out of range.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Out-of-range columns count as full.
    pub fn is_column_full(&self, col: usize) -> bool {
        col >= BOARD_WIDTH || !self.cells[0][col].is_empty()
    }

    /// Lowest empty row in `col`, scanning up from the bottom.
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        if col >= BOARD_WIDTH {
            return None;
        }
        (0..BOARD_HEIGHT)
            .rev()
            .find(|&row| self.cells[row][col].is_empty())
    }

    /// Drops `token` into `col` and returns the row it landed on, or `None`
    /// when the column is full or out of range.
    pub fn drop_token(&mut self, col: usize, token: Token) -> Option<usize> {
        let row = self.landing_row(col)?;
        self.cells[row][col] = Cell::Occupied(token);
        Some(row)
    }

    /// True when every top-row cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells[0].iter().all(|cell| !cell.is_empty())
    }

    pub fn empty_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_empty())
            .count()
    }

    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..BOARD_WIDTH).filter(|&col| !self.is_column_full(col))
    }

    /// Counts `token` cells in column `col`.
    pub fn column_count(&self, col: usize, token: Token) -> usize {
        (0..BOARD_HEIGHT)
            .filter(|&row| self.cells[row][col] == Cell::Occupied(token))
            .count()
    }

    /// Whether the token at (`row`, `col`) completes a line of four on any
    /// axis. The two directions of each axis are counted from the placed
    /// cell and combined, minus the cell itself.
    pub fn connects_four(&self, row: usize, col: usize, token: Token) -> bool {
        if self.cells[row][col] != Cell::Occupied(token) {
            return false;
        }
        AXES.iter().any(|&(dr, dc)| {
            let forward = self.run_length(row, col, dr, dc, token);
            let backward = self.run_length(row, col, -dr, -dc, token);
            forward + backward - 1 >= CONNECT
        })
    }

    /// Whether `token` has four in a row anywhere on the board.
    pub fn has_four(&self, token: Token) -> bool {
        (0..BOARD_HEIGHT)
            .any(|row| (0..BOARD_WIDTH).any(|col| self.connects_four(row, col, token)))
    }

    pub fn key(&self) -> BoardKey {
        let mut key = [0u8; BOARD_CELLS];
        for (slot, cell) in key.iter_mut().zip(self.cells.iter().flatten()) {
            *slot = (*cell).into();
        }
        key
    }

    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, token: Token) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize, col as isize);
        while (0..BOARD_HEIGHT as isize).contains(&r)
            && (0..BOARD_WIDTH as isize).contains(&c)
            && self.cells[r as usize][c as usize] == Cell::Occupied(token)
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Token::Red) => 'R',
                    Cell::Occupied(Token::Yellow) => 'Y',
                })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
