//! In-process game record store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, warn};

use super::record::GameRecord;
use super::store::{CasOutcome, GameStore, JoinOutcome, Snapshot, StoreError, Watcher};
use crate::game::Mark;

/// One stored document. Deleted documents stay behind as tombstones so
/// watchers parked on them still get the deletion notification.
#[derive(Debug)]
struct DocState {
    rev: u64,
    record: Option<GameRecord>,
    changes: broadcast::Sender<()>,
}

impl DocState {
    fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            rev: 0,
            record: None,
            changes,
        }
    }

    fn commit(&mut self, record: Option<GameRecord>) {
        self.rev += 1;
        self.record = record;
        // No receivers is fine; nobody is watching yet.
        let _ = self.changes.send(());
    }
}

/// Game record store held in process memory.
///
/// Backs the HTTP store service and the tests. Cloning shares the same
/// underlying documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<HashMap<String, DocState>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the document's revision exceeds `since`, then returns
    /// the new revision and record (`None` when deleted).
    ///
    /// A document that was never created resolves immediately as deleted.
    pub(crate) async fn wait_for_change(&self, id: &str, since: u64) -> (u64, Option<GameRecord>) {
        loop {
            let mut rx = {
                let docs = self.docs.lock().unwrap();
                match docs.get(id) {
                    None => return (since + 1, None),
                    Some(doc) if doc.rev > since => return (doc.rev, doc.record.clone()),
                    Some(doc) => doc.changes.subscribe(),
                }
            };
            // Lagged receivers just re-check the current revision.
            let _ = rx.recv().await;
        }
    }

}

#[async_trait]
impl GameStore for MemoryStore {
    #[instrument(skip(self, record))]
    async fn create(&self, id: &str, record: GameRecord) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs.entry(id.to_string()).or_insert_with(DocState::new);
        doc.commit(Some(record));
        info!(id, "Record created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<GameRecord>, StoreError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.get(id).and_then(|doc| doc.record.clone()))
    }

    #[instrument(skip(self, record))]
    async fn put(&self, id: &str, record: GameRecord) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        match docs.get_mut(id) {
            Some(doc) if doc.record.is_some() => {
                doc.commit(Some(record));
                debug!(id, rev = doc.rev, "Record updated");
                Ok(())
            }
            _ => {
                warn!(id, "Update of missing record");
                Err(StoreError::new(format!("No such game: {}", id)))
            }
        }
    }

    #[instrument(skip(self, record))]
    async fn update_if_turn(
        &self,
        id: &str,
        mover: Mark,
        record: GameRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut docs = self.docs.lock().unwrap();
        let Some(doc) = docs.get_mut(id) else {
            return Ok(CasOutcome::Missing);
        };
        let Some(current) = doc.record.as_ref() else {
            return Ok(CasOutcome::Missing);
        };
        if current.current_player != mover {
            debug!(id, %mover, current = %current.current_player, "Turn conflict");
            return Ok(CasOutcome::TurnConflict);
        }
        doc.commit(Some(record));
        debug!(id, rev = doc.rev, "Conditional update applied");
        Ok(CasOutcome::Applied)
    }

    #[instrument(skip(self))]
    async fn register_if_vacant(&self, id: &str, name: &str) -> Result<JoinOutcome, StoreError> {
        let mut docs = self.docs.lock().unwrap();
        let Some(doc) = docs.get_mut(id) else {
            return Ok(JoinOutcome::Missing);
        };
        let Some(current) = doc.record.as_ref() else {
            return Ok(JoinOutcome::Missing);
        };
        if current.has_opponent() {
            debug!(id, "Join refused, slot taken");
            return Ok(JoinOutcome::Full);
        }
        let mut record = current.clone();
        record.register_opponent(name);
        doc.commit(Some(record.clone()));
        info!(id, rev = doc.rev, "Opponent registered");
        Ok(JoinOutcome::Joined(record))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs.get_mut(id)
            && doc.record.is_some()
        {
            doc.commit(None);
            info!(id, "Record deleted");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, id: &str) -> Result<Watcher, StoreError> {
        let (tx, rx) = mpsc::channel(16);
        let store = self.clone();
        let id = id.to_string();

        let task = tokio::spawn(async move {
            let mut rev = 0;
            loop {
                let (next, record) = store.wait_for_change(&id, rev).await;
                rev = next;
                let snapshot = match record {
                    Some(record) => Snapshot::Updated(record),
                    None => Snapshot::Deleted,
                };
                let ended = snapshot == Snapshot::Deleted;
                if tx.send(snapshot).await.is_err() || ended {
                    break;
                }
            }
        });

        Ok(Watcher::new(rx, task))
    }
}
