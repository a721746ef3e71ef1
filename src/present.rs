//! The seam to the out-of-scope presentation layer.

use crate::game::{Cell, Mark, Outcome, evaluate};
use crate::remote::GameRecord;
use crate::storage::Theme;

/// Screens the front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Local/online mode selection.
    ModeSelection,
    /// Local two-player name entry.
    LocalSetup,
    /// Online create/join entry.
    OnlineSetup,
    /// The game board.
    Game,
}

/// Instructions to the rendering layer.
///
/// The controller and the synchronization adapter end every interaction by
/// calling into this trait; rendering itself (DOM, terminal, whatever) is
/// the embedder's business.
pub trait Presenter: Send + Sync + std::fmt::Debug {
    /// Switches the visible screen.
    fn show_screen(&self, screen: Screen);

    /// Empties every cell.
    fn clear_board(&self);

    /// Paints a marker into a cell.
    fn update_cell(&self, cell: usize, mark: Mark);

    /// Shows whose turn it is.
    fn update_status(&self, turn: Mark);

    /// Announces the winner and highlights the winning line.
    fn show_winner(&self, mark: Mark, line: [usize; 3]);

    /// Announces a draw.
    fn show_draw(&self);

    /// Refreshes the score display.
    fn update_scores(&self, score_x: u32, score_o: u32);

    /// Displays the session id to share with the other player.
    fn show_session_id(&self, id: &str);

    /// Shows a user-facing notice (bad input, session problems).
    fn show_notice(&self, message: &str);

    /// Applies a theme.
    fn apply_theme(&self, theme: Theme);
}

/// Repaints the presentation from a full remote record.
///
/// The board is cleared and repainted cell by cell, then the terminal
/// message: winner (with the line recomputed from the board itself), draw,
/// or whose turn it is. Online play shows zeroed scores.
pub fn render_record(presenter: &dyn Presenter, record: &GameRecord) {
    presenter.clear_board();
    for (index, cell) in record.board.cells().iter().enumerate() {
        if let Cell::Occupied(mark) = cell {
            presenter.update_cell(index, *mark);
        }
    }

    match evaluate(&record.board) {
        Outcome::Win { mark, line } => presenter.show_winner(mark, line),
        _ if record.draw => presenter.show_draw(),
        _ => presenter.update_status(record.current_player),
    }

    presenter.update_scores(0, 0);
}
