//! Two-player tic-tac-toe with local and online play.
//!
//! The crate splits into a pure game core and the plumbing around it:
//!
//! - **Game**: board, win/draw evaluation, and the per-game state engine
//! - **Storage**: key-value persistence for scores, theme, and session keys
//! - **Remote**: the shared per-session record and the stores it lives in
//! - **Online**: the synchronization adapter binding one client to one
//!   shared record
//! - **App**: the controller a front end drives
//! - **Server**: the HTTP service two clients synchronize through
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_live::remote::MemoryStore;
//! use tictactoe_live::server;
//!
//! # async fn example() -> std::io::Result<()> {
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! server::serve(listener, MemoryStore::default()).await
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod game;
pub mod online;
pub mod present;
pub mod remote;
pub mod server;
pub mod storage;

pub use app::App;
pub use game::{Board, Cell, GameState, Mark, MoveError, Outcome, WIN_LINES, evaluate};
pub use online::{OnlineSession, SessionError};
pub use present::{Presenter, Screen, render_record};
pub use remote::{
    CasOutcome, GameRecord, GameStore, HttpStore, JoinOutcome, MemoryStore, SessionStatus,
    Snapshot, StoreError, Watcher,
};
pub use storage::{FileStore, InMemoryStore, KeyValueStore, ScoreRecord, ScoreStore, Theme};
