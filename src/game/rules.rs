//! Win and draw evaluation for tic-tac-toe.

use super::types::{Board, Cell, Mark};
use tracing::instrument;

/// The 8 fixed winning lines (3 rows, 3 columns, 2 diagonals), as index
/// triples into the row-major board. Shared by every game.
pub const WIN_LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Verdict on a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No winner and at least one empty cell remains.
    Ongoing,
    /// A line is uniformly occupied by one marker.
    Win {
        /// The winning marker.
        mark: Mark,
        /// The winning line's cell indices.
        line: [usize; 3],
    },
    /// The board is full with no winning line.
    Draw,
}

/// Evaluates a board position.
///
/// Scans [`WIN_LINES`] in fixed order and reports the first uniformly
/// occupied line; only a full board with no such line is a draw. Win is
/// always checked ahead of draw, so a winning move into the last empty
/// cell reports a win.
#[instrument]
pub fn evaluate(board: &Board) -> Outcome {
    for line in WIN_LINES {
        let [a, b, c] = line;
        if let Some(Cell::Occupied(mark)) = board.get(a)
            && board.get(b) == Some(Cell::Occupied(mark))
            && board.get(c) == Some(Cell::Occupied(mark))
        {
            return Outcome::Win { mark, line };
        }
    }

    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::Ongoing
    }
}
