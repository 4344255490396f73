//! # State Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.
//!
//! ```toml
//! id_limit = 4294967295
//! initial_capacity = 1024
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`State`](crate::State).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Exclusive upper bound on issued entity ids.
    pub id_limit: u32,
    /// Entities to reserve table space for up front.
    pub initial_capacity: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            id_limit: u32::MAX,
            initial_capacity: 1024,
        }
    }
}

impl StateConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// when `id_limit` leaves no issuable id.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when `id_limit < 2` (id 0 is reserved, so
    /// nothing could ever be issued).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_limit < 2 {
            return Err(ConfigError::Invalid(format!(
                "id_limit must be at least 2, got {}",
                self.id_limit
            )));
        }
        Ok(())
    }
}
