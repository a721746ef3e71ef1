//! Shared game records and the document store they live in.

mod http;
mod memory;
mod record;
mod store;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use record::{GameRecord, PlayerSlot, Roster, SessionStatus};
pub use store::{CasOutcome, GameStore, JoinOutcome, Snapshot, StoreError, WatchResponse, Watcher};
