//! Theme preference persistence.

use tracing::instrument;

use super::kv::{KeyValueStore, StorageError, keys};

/// Visual theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light theme.
    Light,
    /// Dark theme (the default).
    #[default]
    Dark,
}

impl Theme {
    /// Converts the theme to its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light-mode",
            Theme::Dark => "dark-mode",
        }
    }

    /// Parses a theme from its stored string.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "light-mode" => Some(Theme::Light),
            "dark-mode" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// Returns the other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Loads the saved preference, defaulting to dark when unset or
    /// unrecognized.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store fails.
    #[instrument(skip(kv))]
    pub fn load(kv: &dyn KeyValueStore) -> Result<Self, StorageError> {
        Ok(kv
            .get(keys::THEME)?
            .and_then(|raw| Self::from_code(&raw))
            .unwrap_or_default())
    }

    /// Persists this theme as the preference.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store fails.
    #[instrument(skip(kv))]
    pub fn store(self, kv: &dyn KeyValueStore) -> Result<(), StorageError> {
        kv.set(keys::THEME, self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::super::kv::InMemoryStore;
    use super::*;

    #[test]
    fn test_defaults_to_dark() {
        let kv = InMemoryStore::new();
        assert_eq!(Theme::load(&kv).expect("Load failed"), Theme::Dark);
    }

    #[test]
    fn test_round_trip() {
        let kv = InMemoryStore::new();
        Theme::Light.store(&kv).expect("Store failed");
        assert_eq!(Theme::load(&kv).expect("Load failed"), Theme::Light);
    }

    #[test]
    fn test_toggle_is_involution() {
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
    }
}
