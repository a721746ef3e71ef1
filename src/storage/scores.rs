//! Persistent score records.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::kv::{KeyValueStore, StorageError, keys};

/// Persisted score tally, keyed by the two participating player names.
///
/// Field names match the stored JSON layout so existing saves stay
/// readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct ScoreRecord {
    /// Wins credited to X.
    #[serde(rename = "X")]
    score_x: u32,
    /// Wins credited to O.
    #[serde(rename = "O")]
    score_o: u32,
    /// Name of the player using X.
    #[serde(rename = "playerXName")]
    player_x_name: String,
    /// Name of the player using O.
    #[serde(rename = "playerOName")]
    player_o_name: String,
}

impl ScoreRecord {
    /// Whether the record belongs to exactly this pairing of names.
    pub fn matches(&self, name_x: &str, name_o: &str) -> bool {
        self.player_x_name == name_x && self.player_o_name == name_o
    }
}

/// Loads and saves the single score record slot.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ScoreStore {
    /// Creates a score store over the given key-value storage.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Reads the persisted record. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store fails or the record is corrupt.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Option<ScoreRecord>, StorageError> {
        let record = match self.kv.get(keys::SCORES)? {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        debug!(found = record.is_some(), "Loaded score record");
        Ok(record)
    }

    /// Overwrites the persisted record in one write (last writer wins).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store fails.
    #[instrument(skip(self, record), fields(x = record.score_x, o = record.score_o))]
    pub fn save(&self, record: &ScoreRecord) -> Result<(), StorageError> {
        self.kv.set(keys::SCORES, &serde_json::to_string(record)?)?;
        info!("Score record saved");
        Ok(())
    }

    /// Deletes the persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store fails.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(keys::SCORES)?;
        info!("Score record cleared");
        Ok(())
    }
}
