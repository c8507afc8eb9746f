//! Library tuning knobs, loadable from a JSON file.

use std::path::Path;

use hashbrown::HashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Genre;

/// Slots per shelf when a genre has no override.
pub const DEFAULT_SHELF_CAPACITY: usize = 5;
/// Days between issue and due date.
pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 14;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Shelving, lending, and undo configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Slots per shelf for genres without an override.
    pub default_shelf_capacity: usize,
    /// Per-genre slot counts.
    pub shelf_capacity: HashMap<Genre, usize>,
    /// Ceiling on shelves per genre; `None` grows without bound.
    pub max_shelves_per_genre: Option<usize>,
    /// Loan length in days.
    pub loan_period_days: u32,
    /// Undo history bound; `None` keeps everything.
    pub undo_limit: Option<usize>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_shelf_capacity: DEFAULT_SHELF_CAPACITY,
            shelf_capacity: HashMap::new(),
            max_shelves_per_genre: None,
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            undo_limit: None,
        }
    }
}

impl LibraryConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path)?;
        let cfg: Self = serde_json::from_slice(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Slots per shelf for `genre`.
    pub fn capacity_for(&self, genre: Genre) -> usize {
        self.shelf_capacity
            .get(&genre)
            .copied()
            .unwrap_or(self.default_shelf_capacity)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_shelf_capacity == 0 || self.shelf_capacity.values().any(|c| *c == 0) {
            return Err(ConfigError::Invalid(
                "shelf capacity must be at least 1".to_string(),
            ));
        }
        if self.max_shelves_per_genre == Some(0) {
            return Err(ConfigError::Invalid(
                "max_shelves_per_genre must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}
