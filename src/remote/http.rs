//! HTTP client for a remote game record service.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use super::record::{GameRecord, PlayerSlot};
use super::store::{CasOutcome, GameStore, JoinOutcome, Snapshot, StoreError, WatchResponse, Watcher};
use crate::game::Mark;

/// Pause before retrying a failed watch poll.
const WATCH_RETRY: Duration = Duration::from_secs(1);

/// [`GameStore`] implementation over the HTTP service in [`crate::server`].
///
/// Change notifications arrive through a revision-based long-poll loop.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    /// Creates a client for the service at `base_url`
    /// (e.g. `http://127.0.0.1:3000`).
    #[instrument]
    pub fn new(base_url: impl Into<String> + std::fmt::Debug) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn game_url(&self, id: &str) -> String {
        format!("{}/games/{}", self.base_url, id)
    }
}

#[async_trait]
impl GameStore for HttpStore {
    #[instrument(skip(self, record))]
    async fn create(&self, id: &str, record: GameRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.game_url(id))
            .json(&record)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::new(format!(
                "Create failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<GameRecord>, StoreError> {
        let response = self.client.get(self.game_url(id)).send().await?;
        match response.status().as_u16() {
            404 => Ok(None),
            code if (200..300).contains(&code) => Ok(Some(response.json().await?)),
            code => Err(StoreError::new(format!("Read failed with status {}", code))),
        }
    }

    #[instrument(skip(self, record))]
    async fn put(&self, id: &str, record: GameRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.game_url(id))
            .json(&record)
            .send()
            .await?;
        match response.status().as_u16() {
            404 => Err(StoreError::new(format!("No such game: {}", id))),
            code if (200..300).contains(&code) => Ok(()),
            code => Err(StoreError::new(format!(
                "Update failed with status {}",
                code
            ))),
        }
    }

    #[instrument(skip(self, record))]
    async fn update_if_turn(
        &self,
        id: &str,
        mover: Mark,
        record: GameRecord,
    ) -> Result<CasOutcome, StoreError> {
        let url = format!("{}/turn/{}", self.game_url(id), mover.as_str());
        let response = self.client.put(url).json(&record).send().await?;
        match response.status().as_u16() {
            404 => Ok(CasOutcome::Missing),
            409 => Ok(CasOutcome::TurnConflict),
            code if (200..300).contains(&code) => Ok(CasOutcome::Applied),
            code => Err(StoreError::new(format!(
                "Conditional update failed with status {}",
                code
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn register_if_vacant(&self, id: &str, name: &str) -> Result<JoinOutcome, StoreError> {
        let url = format!("{}/players", self.game_url(id));
        let response = self
            .client
            .post(url)
            .json(&PlayerSlot::new(name.to_string()))
            .send()
            .await?;
        match response.status().as_u16() {
            404 => Ok(JoinOutcome::Missing),
            409 => Ok(JoinOutcome::Full),
            code if (200..300).contains(&code) => Ok(JoinOutcome::Joined(response.json().await?)),
            code => Err(StoreError::new(format!("Join failed with status {}", code))),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self.client.delete(self.game_url(id)).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::new(format!(
                "Delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, id: &str) -> Result<Watcher, StoreError> {
        let (tx, rx) = mpsc::channel(16);
        let client = self.client.clone();
        let base = self.game_url(id);

        let task = tokio::spawn(async move {
            let mut rev = 0u64;
            loop {
                let url = format!("{}/watch?rev={}", base, rev);
                let watch: Result<WatchResponse, reqwest::Error> = async {
                    client.get(&url).send().await?.json().await
                }
                .await;

                let watch = match watch {
                    Ok(watch) => watch,
                    Err(err) => {
                        // Transient network failure; keep the subscription
                        // alive and retry.
                        warn!(error = %err, "Watch poll failed, retrying");
                        tokio::time::sleep(WATCH_RETRY).await;
                        continue;
                    }
                };

                if watch.rev == rev {
                    // Idle poll timed out server-side; re-arm.
                    debug!(rev, "Watch poll idle");
                    continue;
                }

                rev = watch.rev;
                let snapshot = match watch.record {
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
