//! Periodic and on-change persistence of a board.

use super::{BlobStore, StorageError, StorageResult};
use crate::board::BoardState;
use crate::config::BoardConfig;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Saves one board under its storage key.
pub struct AutoSaveManager<S: BlobStore> {
    store: Arc<S>,
    key: String,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl<S: BlobStore> AutoSaveManager<S> {
    /// Create a new auto-save manager for the board described by `config`.
    pub fn new(store: Arc<S>, config: &BoardConfig) -> Self {
        Self {
            store,
            key: config.storage_key(),
            interval: Duration::from_secs(config.autosave_interval_secs),
            last_save: None,
            dirty: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if enough time has passed for a periodic save.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if dirty and the interval has elapsed. Returns true if a save
    /// happened.
    pub fn maybe_save(&mut self, board: &BoardState) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(board)?;
        Ok(true)
    }

    /// Save immediately.
    pub fn save(&mut self, board: &BoardState) -> StorageResult<()> {
        let json = board.to_json()?;
        self.store.save(&self.key, &json)?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Load the saved board.
    ///
    /// Fails with [`StorageError::NotFound`] if nothing is saved, or
    /// [`StorageError::Serialization`] if the blob is malformed.
    pub fn load(&mut self, config: &BoardConfig) -> StorageResult<BoardState> {
        let json = self
            .store
            .load(&self.key)?
            .ok_or_else(|| StorageError::NotFound(self.key.clone()))?;
        let board = BoardState::import_json(&json, config)?;
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Ok(board)
    }

    /// Load the saved board, falling back to an empty one if nothing usable
    /// is stored.
    pub fn restore(&mut self, config: &BoardConfig) -> BoardState {
        match self.load(config) {
            Ok(board) => board,
            Err(StorageError::NotFound(_)) => BoardState::new(config),
            Err(e) => {
                log::warn!("could not restore {}: {e}", self.key);
                BoardState::new(config)
            }
        }
    }
}
