//! Synchronization adapter for online sessions.
//!
//! One [`OnlineSession`] mirrors the game state of one shared record. The
//! remote record is the single source of truth: moves are validated
//! locally, committed with one turn-guarded write, and every remote change
//! (including our own) comes back through the subscription and overwrites
//! the local projection wholesale.

use derive_more::{Display, Error};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::game::{GameState, Mark, Outcome, evaluate};
use crate::present::{Presenter, Screen, render_record};
use crate::remote::{
    CasOutcome, GameRecord, GameStore, JoinOutcome, SessionStatus, Snapshot, StoreError,
};
use crate::storage::{KeyValueStore, StorageError, keys};

/// Attempts at the read-validate-commit cycle before giving up on a move.
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Session-level failures surfaced to the user.
#[derive(Debug, Clone, Display, Error)]
pub enum SessionError {
    /// No record exists under the given session id.
    #[display("Game not found.")]
    NotFound,
    /// The session already has two players.
    #[display("This game already has two players.")]
    SessionFull,
    /// The store itself failed.
    #[display("{_0}")]
    Store(StoreError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

/// One participant's handle on an online game.
#[derive(Debug)]
pub struct OnlineSession {
    id: String,
    local_mark: Mark,
    store: Arc<dyn GameStore>,
    projection: Arc<Mutex<GameState>>,
    listener: Option<JoinHandle<()>>,
}

impl OnlineSession {
    /// Creates a new session as the host. The host always plays X and the
    /// record starts in `waiting` with an empty board.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the record cannot be written.
    #[instrument(skip(store))]
    pub async fn create(
        store: Arc<dyn GameStore>,
        host_name: &str,
    ) -> Result<Self, SessionError> {
        let id = generate_session_id();
        store.create(&id, GameRecord::fresh(host_name)).await?;
        info!(session_id = %id, "Created online session");
        Ok(Self::handle(id, Mark::X, store))
    }

    /// Joins an existing session as O.
    ///
    /// Requires the record to exist and its O slot to be free; registration
    /// and the status flip to `playing` happen in one atomic store step, so
    /// two simultaneous joiners cannot both take the slot. Returns the
    /// session together with the post-join record (the caller wants the
    /// host's name).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] or [`SessionError::SessionFull`]
    /// for the user-facing cases, [`SessionError::Store`] otherwise.
    #[instrument(skip(store))]
    pub async fn join(
        store: Arc<dyn GameStore>,
        session_id: &str,
        name: &str,
    ) -> Result<(Self, GameRecord), SessionError> {
        match store.register_if_vacant(session_id, name).await? {
            JoinOutcome::Joined(record) => {
                info!(session_id, "Joined online session as O");
                Ok((Self::handle(session_id.to_string(), Mark::O, store), record))
            }
            JoinOutcome::Full => {
                warn!(session_id, "Join refused, session full");
                Err(SessionError::SessionFull)
            }
            JoinOutcome::Missing => Err(SessionError::NotFound),
        }
    }

    /// Rebuilds a session handle from cached id and marker, for resumption
    /// after a reload. The next snapshot repaints everything.
    #[instrument(skip(store))]
    pub fn resume(store: Arc<dyn GameStore>, id: String, local_mark: Mark) -> Self {
        info!(session_id = %id, %local_mark, "Resuming online session");
        Self::handle(id, local_mark, store)
    }

    fn handle(id: String, local_mark: Mark, store: Arc<dyn GameStore>) -> Self {
        Self {
            id,
            local_mark,
            store,
            projection: Arc::new(Mutex::new(GameState::new())),
            listener: None,
        }
    }

    /// The session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The marker this participant plays.
    pub fn local_mark(&self) -> Mark {
        self.local_mark
    }

    /// A copy of the current local projection of the remote state.
    pub fn projection(&self) -> GameState {
        self.projection.lock().unwrap().clone()
    }

    /// Attempts a move at `cell`. Returns whether a write was committed.
    ///
    /// The protocol: read the record; reject locally, with no write, if
    /// it is missing, not in `playing`, the cell is occupied, or it is not
    /// this participant's turn; otherwise evaluate the candidate board and
    /// commit the full updated record with a turn-guarded write. A write
    /// conflict re-reads and re-validates, so a move that lost the race is
    /// rejected by the turn check like any other stale move.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for store/network failures; every
    /// rule-level rejection is `Ok(false)`.
    #[instrument(skip(self), fields(session_id = %self.id, mark = %self.local_mark))]
    pub async fn make_move(&self, cell: usize) -> Result<bool, StoreError> {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let Some(record) = self.store.get(&self.id).await? else {
                debug!(cell, "Move rejected, record missing");
                return Ok(false);
            };

            if record.status != SessionStatus::Playing
                || !record.board.is_empty_cell(cell)
                || record.current_player != self.local_mark
            {
                debug!(cell, status = ?record.status, "Move rejected locally");
                return Ok(false);
            }

            let mut next = record;
            if next.board.place(cell, self.local_mark).is_err() {
                return Ok(false);
            }

            match evaluate(&next.board) {
                Outcome::Win { mark, .. } => {
                    next.winner = Some(mark);
                    next.status = SessionStatus::Finished;
                }
                Outcome::Draw => {
                    next.draw = true;
                    next.status = SessionStatus::Finished;
                }
                Outcome::Ongoing => {}
            }
            next.current_player = self.local_mark.opponent();

            match self
                .store
                .update_if_turn(&self.id, self.local_mark, next)
                .await?
            {
                CasOutcome::Applied => {
                    info!(cell, "Move committed");
                    return Ok(true);
                }
                CasOutcome::TurnConflict => {
                    debug!(cell, attempt, "Commit lost the race, re-reading");
                    continue;
                }
                CasOutcome::Missing => return Ok(false),
            }
        }
        Ok(false)
    }

    /// Starts a rematch: overwrites the record with an empty `playing`
    /// board, X to move, roster kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn restart(&self) -> Result<(), StoreError> {
        if let Some(mut record) = self.store.get(&self.id).await? {
            record.reset_for_rematch();
            self.store.put(&self.id, record).await?;
            info!("Session restarted");
        }
        Ok(())
    }

    /// Subscribes to the record and starts forwarding snapshots to the
    /// presenter, replacing any prior subscription first (at most one is
    /// live per session).
    ///
    /// Each snapshot overwrites the local projection and repaints. A
    /// deleted record surfaces "game not found" and returns the front end
    /// to mode selection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the subscription cannot be established.
    #[instrument(skip(self, presenter), fields(session_id = %self.id))]
    pub async fn start_listener(
        &mut self,
        presenter: Arc<dyn Presenter>,
    ) -> Result<(), StoreError> {
        if let Some(prior) = self.listener.take() {
            prior.abort();
            debug!("Disposed prior subscription");
        }

        let mut watcher = self.store.subscribe(&self.id).await?;
        let projection = Arc::clone(&self.projection);

        let task = tokio::spawn(async move {
            while let Some(snapshot) = watcher.recv().await {
                match snapshot {
                    Snapshot::Updated(record) => {
                        {
                            let mut view = projection.lock().unwrap();
                            view.project_remote(
                                record.board.clone(),
                                record.current_player,
                                record.status == SessionStatus::Playing,
                            );
                        }
                        render_record(presenter.as_ref(), &record);
                    }
                    Snapshot::Deleted => {
                        warn!("Session record deleted");
                        presenter.show_notice("Game not found or deleted.");
                        presenter.show_screen(Screen::ModeSelection);
                        break;
                    }
                }
            }
        });

        self.listener = Some(task);
        info!("Listening for session changes");
        Ok(())
    }

    /// Caches this session's id and marker for resumption on reload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the local store fails.
    pub fn remember(&self, kv: &dyn KeyValueStore) -> Result<(), StorageError> {
        kv.set(keys::ONLINE_GAME_ID, &self.id)?;
        kv.set(keys::ONLINE_PLAYER_MARK, self.local_mark.as_str())
    }

    /// Reads a cached session id and marker, if both are present and valid.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the local store fails.
    pub fn recall(kv: &dyn KeyValueStore) -> Result<Option<(String, Mark)>, StorageError> {
        let id = kv.get(keys::ONLINE_GAME_ID)?;
        let mark = kv.get(keys::ONLINE_PLAYER_MARK)?;
        Ok(match (id, mark) {
            (Some(id), Some(mark)) => Mark::from_code(&mark).map(|mark| (id, mark)),
            _ => None,
        })
    }

    /// Removes the cached session keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the local store fails.
    pub fn forget(kv: &dyn KeyValueStore) -> Result<(), StorageError> {
        kv.remove(keys::ONLINE_GAME_ID)?;
        kv.remove(keys::ONLINE_PLAYER_MARK)
    }
}

impl Drop for OnlineSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Generates a short session id, base-36 over the current clock reading.
fn generate_session_id() -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        ^ u128::from(std::process::id()).rotate_left(64);

    let mut id = String::with_capacity(7);
    for _ in 0..7 {
        id.push(DIGITS[(seed % 36) as usize] as char);
        seed /= 36;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_short_and_distinct() {
        let a = generate_session_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = generate_session_id();
        assert_eq!(a.len(), 7);
        assert_ne!(a, b);
    }
}
