//! Board geometry and reserved identities.

/// Number of columns on the board.
pub const BOARD_WIDTH: usize = 7;

/// Number of rows on the board.
pub const BOARD_HEIGHT: usize = 6;

/// Total number of cells.
pub const BOARD_CELLS: usize = BOARD_WIDTH * BOARD_HEIGHT;

/// Tokens in a row needed to win.
pub const CONNECT: usize = 4;

/// Column index of the center column.
pub const CENTER_COLUMN: usize = BOARD_WIDTH / 2;

/// Seat identity reserved for the computer opponent.
pub const BOT_ID: &str = "bot";
