//! Game state engine: turn handling, settlement, and score tally.

use super::rules::{Outcome, evaluate};
use super::types::{Board, Mark, MoveError};
use crate::storage::ScoreRecord;
use tracing::{debug, info, instrument};

/// Complete state of one game between two named players.
///
/// Each local game and each online session owns its own instance; there is
/// no shared ambient state. In online play the instance is a disposable
/// projection, fully overwritten from each remote snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    current_turn: Mark,
    active: bool,
    score_x: u32,
    score_o: u32,
    player_x_name: String,
    player_o_name: String,
}

impl GameState {
    /// Creates a fresh game: empty board, X to move, zero scores.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            current_turn: Mark::X,
            active: true,
            score_x: 0,
            score_o: 0,
            player_x_name: String::new(),
            player_o_name: String::new(),
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the marker whose turn it is.
    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    /// Whether the game is still accepting moves.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// X's win tally.
    pub fn score_x(&self) -> u32 {
        self.score_x
    }

    /// O's win tally.
    pub fn score_o(&self) -> u32 {
        self.score_o
    }

    /// Name of the player using X.
    pub fn player_x_name(&self) -> &str {
        &self.player_x_name
    }

    /// Name of the player using O.
    pub fn player_o_name(&self) -> &str {
        &self.player_o_name
    }

    /// Assigns player names and adopts stored scores.
    ///
    /// `name_x` takes the first marker, `name_o` the second, and the turn
    /// always resets to X. The stored record is adopted only when both
    /// names match it exactly; a new pairing (or no record) zeroes both
    /// scores silently.
    #[instrument(skip(self, stored))]
    pub fn initialize_players(&mut self, name_x: &str, name_o: &str, stored: Option<&ScoreRecord>) {
        self.player_x_name = name_x.to_string();
        self.player_o_name = name_o.to_string();
        self.current_turn = Mark::X;

        match stored {
            Some(record) if record.matches(name_x, name_o) => {
                self.score_x = *record.score_x();
                self.score_o = *record.score_o();
                info!(
                    score_x = self.score_x,
                    score_o = self.score_o,
                    "Restored scores for returning pairing"
                );
            }
            Some(_) => {
                self.score_x = 0;
                self.score_o = 0;
                debug!("Stored scores belong to a different pairing, starting at zero");
            }
            None => {
                self.score_x = 0;
                self.score_o = 0;
            }
        }
    }

    /// Writes the current turn's marker into the target cell.
    ///
    /// Does not advance the turn; callers settle the board and then switch.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] when the game is inactive or the cell is
    /// occupied or out of range. Nothing is mutated on rejection.
    #[instrument(skip(self), fields(turn = %self.current_turn))]
    pub fn handle_move(&mut self, cell: usize) -> Result<(), MoveError> {
        if !self.active {
            return Err(MoveError::GameOver);
        }
        self.board.place(cell, self.current_turn)
    }

    /// Evaluates the board and applies the consequences.
    ///
    /// On a win the game deactivates and the winning marker's score is
    /// credited; the winner is read from the line itself, so callers may
    /// switch turns in any order without misattributing the win. On a draw
    /// the game deactivates. A game that already settled is not credited
    /// again.
    #[instrument(skip(self))]
    pub fn settle(&mut self) -> Outcome {
        let outcome = evaluate(&self.board);
        if !self.active {
            return outcome;
        }

        match outcome {
            Outcome::Win { mark, line } => {
                self.active = false;
                match mark {
                    Mark::X => self.score_x += 1,
                    Mark::O => self.score_o += 1,
                }
                info!(winner = %mark, ?line, "Game won");
            }
            Outcome::Draw => {
                self.active = false;
                info!("Game drawn");
            }
            Outcome::Ongoing => {}
        }

        outcome
    }

    /// Plays one full turn: place, settle, and switch if the game goes on.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] from [`GameState::handle_move`]; nothing is
    /// mutated on rejection.
    #[instrument(skip(self))]
    pub fn play(&mut self, cell: usize) -> Result<Outcome, MoveError> {
        self.handle_move(cell)?;
        let outcome = self.settle();
        if outcome == Outcome::Ongoing {
            self.switch_player();
        }
        Ok(outcome)
    }

    /// Flips the current turn between the two markers. Always succeeds.
    pub fn switch_player(&mut self) {
        self.current_turn = self.current_turn.opponent();
    }

    /// Starts a new round: empty board, X to move, game active.
    ///
    /// Scores and player names persist across the reset.
    #[instrument(skip(self))]
    pub fn reset_game(&mut self) {
        self.board = Board::new();
        self.current_turn = Mark::X;
        self.active = true;
        debug!("Game reset");
    }

    /// Zeroes both in-memory scores.
    pub fn reset_scores(&mut self) {
        self.score_x = 0;
        self.score_o = 0;
    }

    /// Snapshot of scores and names in their persisted form.
    pub fn score_record(&self) -> ScoreRecord {
        ScoreRecord::new(
            self.score_x,
            self.score_o,
            self.player_x_name.clone(),
            self.player_o_name.clone(),
        )
    }

    /// Overwrites the projected fields from a shared remote record.
    ///
    /// The remote record is the single source of truth in online play;
    /// board, turn, and activity are replaced wholesale. Scores and names
    /// are left alone.
    pub(crate) fn project_remote(&mut self, board: Board, current_turn: Mark, active: bool) {
        self.board = board;
        self.current_turn = current_turn;
        self.active = active;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
