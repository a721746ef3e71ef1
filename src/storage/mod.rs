//! Local persistence: key-value storage, score records, theme preference.

mod kv;
mod scores;
mod theme;

pub use kv::{FileStore, InMemoryStore, KeyValueStore, StorageError, keys};
pub use scores::{ScoreRecord, ScoreStore};
pub use theme::Theme;
