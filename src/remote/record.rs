//! The shared per-session game record.

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::game::{Board, Mark};

/// Lifecycle status of an online session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created by the host; waiting for a second participant.
    Waiting,
    /// Both participants registered; moves accepted.
    Playing,
    /// A move produced a winner or filled the board.
    Finished,
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PlayerSlot {
    /// Display name.
    pub name: String,
}

/// The two participant slots. The host always holds X; the joiner O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// The host.
    #[serde(rename = "X")]
    pub x: PlayerSlot,
    /// The joiner, once present.
    #[serde(rename = "O", default, skip_serializing_if = "Option::is_none")]
    pub o: Option<PlayerSlot>,
}

/// The full shared record for one online session.
///
/// This is the single source of truth both clients converge on; each
/// client's local state is a projection overwritten from it. The field
/// names are the wire schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Board as a 9-slot array of marker-or-null.
    pub board: Board,
    /// Marker whose turn it is.
    #[serde(rename = "currentPlayer")]
    pub current_player: Mark,
    /// Session lifecycle status.
    pub status: SessionStatus,
    /// Registered participants.
    pub players: Roster,
    /// Winning marker once the game is won.
    pub winner: Option<Mark>,
    /// Whether the game ended with a full, winnerless board.
    pub draw: bool,
}

impl GameRecord {
    /// A freshly created session: empty board, X to move, host registered,
    /// waiting for an opponent.
    pub fn fresh(host_name: &str) -> Self {
        Self {
            board: Board::new(),
            current_player: Mark::X,
            status: SessionStatus::Waiting,
            players: Roster {
                x: PlayerSlot::new(host_name.to_string()),
                o: None,
            },
            winner: None,
            draw: false,
        }
    }

    /// Whether the O slot is taken.
    pub fn has_opponent(&self) -> bool {
        self.players.o.is_some()
    }

    /// Registers the joiner as O and starts play. One logical update.
    pub fn register_opponent(&mut self, name: &str) {
        self.players.o = Some(PlayerSlot::new(name.to_string()));
        self.status = SessionStatus::Playing;
    }

    /// Resets the record for a rematch, keeping the roster.
    pub fn reset_for_rematch(&mut self) {
        self.board = Board::new();
        self.current_player = Mark::X;
        self.winner = None;
        self.draw = false;
        self.status = SessionStatus::Playing;
    }
}
