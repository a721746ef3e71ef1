//! Local key-value persistence.
//!
//! Models the fixed-key local storage the game keeps between sessions:
//! one score record, the theme preference, and the online-resumption keys.

use derive_more::{Display, Error};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Well-known storage keys.
pub mod keys {
    /// The persisted score record.
    pub const SCORES: &str = "ticTacToeScores";
    /// The theme preference string.
    pub const THEME: &str = "theme";
    /// Last-used online session id, for resumption on reload.
    pub const ONLINE_GAME_ID: &str = "onlineGameId";
    /// The local participant's marker in that session.
    pub const ONLINE_PLAYER_MARK: &str = "onlinePlayerSymbol";
}

/// Storage error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error: {} at {}:{}", message, file, line)]
pub struct StorageError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl StorageError {
    /// Creates a new storage error with caller location tracking.
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

impl From<std::io::Error> for StorageError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for StorageError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}

/// String key-value storage under fixed well-known keys.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Reads a value; absence is not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, overwriting any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes a key. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Key-value store persisted as a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file and
/// rename, so a record overwrite is atomic (last writer wins).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the given file path.
    ///
    /// The file is created on first write; a missing file reads as empty.
    #[instrument]
    pub fn new(path: impl Into<PathBuf> + std::fmt::Debug) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.read_all()?.remove(key);
        debug!(key, found = value.is_some(), "Read key");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        debug!(key, "Wrote key");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
            debug!(key, "Removed key");
        }
        Ok(())
    }
}

/// In-memory key-value store for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
