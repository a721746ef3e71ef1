//! The document store seam the synchronization adapter is written against.

use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::record::GameRecord;
use crate::game::Mark;

/// Document store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP error: {}", err))
    }
}

/// Result of a conditional (turn-guarded) write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write was applied.
    Applied,
    /// The remote turn no longer matched the acting marker.
    TurnConflict,
    /// The record does not exist.
    Missing,
}

/// Result of an atomic opponent registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The joiner took the vacant slot; carries the post-join record.
    Joined(GameRecord),
    /// The slot was already taken.
    Full,
    /// The record does not exist.
    Missing,
}

/// A change notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// The record changed (or was first observed); the full record.
    Updated(GameRecord),
    /// The record was deleted or does not exist.
    Deleted,
}

/// Payload of one long-poll watch round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchResponse {
    /// Revision of the returned state. Equal to the requested revision
    /// when the poll timed out with no change.
    pub rev: u64,
    /// The record, or `None` when deleted/absent.
    pub record: Option<GameRecord>,
}

/// A shared store of per-session game records.
///
/// Updates are whole-record overwrites. [`GameStore::update_if_turn`] is
/// the turn-guarded variant the move protocol uses so two near-simultaneous
/// writes for the same turn cannot both land.
#[async_trait]
pub trait GameStore: Send + Sync + std::fmt::Debug {
    /// Creates (or overwrites) the record under `id`.
    async fn create(&self, id: &str, record: GameRecord) -> Result<(), StoreError>;

    /// Reads the record. Absence is not an error.
    async fn get(&self, id: &str) -> Result<Option<GameRecord>, StoreError>;

    /// Overwrites an existing record, last writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record does not exist.
    async fn put(&self, id: &str, record: GameRecord) -> Result<(), StoreError>;

    /// Overwrites the record only if its current turn still equals `mover`.
    async fn update_if_turn(
        &self,
        id: &str,
        mover: Mark,
        record: GameRecord,
    ) -> Result<CasOutcome, StoreError>;

    /// Registers `name` as O and starts play, only if the O slot is still
    /// vacant. Check and write are one atomic step, so two simultaneous
    /// joiners cannot both take the slot.
    async fn register_if_vacant(&self, id: &str, name: &str) -> Result<JoinOutcome, StoreError>;

    /// Deletes the record. Subscribers observe [`Snapshot::Deleted`].
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Subscribes to the record's changes.
    ///
    /// The watcher delivers an initial snapshot (the current record, or
    /// [`Snapshot::Deleted`] for an absent one), then every subsequent
    /// change including the subscriber's own writes. Delivery ends after
    /// a deletion.
    async fn subscribe(&self, id: &str) -> Result<Watcher, StoreError>;
}

/// A live subscription to one record.
///
/// At most one watcher should be live per session; dropping it aborts the
/// delivery task, which is the disposal the session lifecycle requires.
#[derive(Debug)]
pub struct Watcher {
    rx: mpsc::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Watcher {
    pub(crate) fn new(rx: mpsc::Receiver<Snapshot>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Receives the next snapshot; `None` once delivery has ended.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
