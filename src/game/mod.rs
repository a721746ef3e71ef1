//! Tic-tac-toe game core: board, rules, and the game state engine.

mod engine;
mod rules;
mod types;

pub use engine::GameState;
pub use rules::{Outcome, WIN_LINES, evaluate};
pub use types::{Board, Cell, Mark, MoveError};
