//! Core domain types for tic-tac-toe.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// A player's marker on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Marker X (goes first).
    X,
    /// Marker O (goes second).
    O,
}

impl Mark {
    /// Returns the opposing marker.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Converts the marker to its wire/storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }

    /// Parses a marker from its wire/storage string.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "X" => Some(Mark::X),
            "O" => Some(Mark::O),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell on the 3x3 board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Empty cell.
    Empty,
    /// Cell occupied by a marker.
    Occupied(Mark),
}

impl Cell {
    /// Returns the occupying marker, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(mark) => Some(mark),
        }
    }
}

/// Reasons a move is rejected. Rejected moves never mutate the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Cell index is outside 0-8.
    #[display("Cell index out of bounds")]
    OutOfBounds,
    /// Target cell is already occupied.
    #[display("Cell is already occupied")]
    CellOccupied,
    /// The game has already ended.
    #[display("Game is not active")]
    GameOver,
}

/// 3x3 tic-tac-toe board, cells indexed 0-8 in row-major order.
///
/// Serializes as a 9-slot array of marker-or-null, the shape shared
/// game records use on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[Option<Mark>; 9]", into = "[Option<Mark>; 9]")]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Gets the cell at the given index (0-8).
    pub fn get(&self, cell: usize) -> Option<Cell> {
        self.cells.get(cell).copied()
    }

    /// Checks whether a cell is present and empty.
    pub fn is_empty_cell(&self, cell: usize) -> bool {
        matches!(self.get(cell), Some(Cell::Empty))
    }

    /// Checks whether every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| *c != Cell::Empty)
    }

    /// Returns all cells as a slice.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Writes `mark` into the target cell.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutOfBounds`] or [`MoveError::CellOccupied`];
    /// the board is untouched on rejection. An occupied cell never reverts
    /// to empty except through a full reset.
    pub fn place(&mut self, cell: usize, mark: Mark) -> Result<(), MoveError> {
        match self.get(cell) {
            None => Err(MoveError::OutOfBounds),
            Some(Cell::Occupied(_)) => Err(MoveError::CellOccupied),
            Some(Cell::Empty) => {
                self.cells[cell] = Cell::Occupied(mark);
                Ok(())
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[Option<Mark>; 9]> for Board {
    fn from(slots: [Option<Mark>; 9]) -> Self {
        let mut cells = [Cell::Empty; 9];
        for (cell, slot) in cells.iter_mut().zip(slots) {
            if let Some(mark) = slot {
                *cell = Cell::Occupied(mark);
            }
        }
        Self { cells }
    }
}

impl From<Board> for [Option<Mark>; 9] {
    fn from(board: Board) -> Self {
        let mut slots = [None; 9];
        for (slot, cell) in slots.iter_mut().zip(board.cells) {
            *slot = cell.mark();
        }
        slots
    }
}
