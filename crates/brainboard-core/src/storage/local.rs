//! Browser local storage backend.

use super::{BlobStore, StorageError, StorageResult};
use web_sys::Storage;

/// Blob store over `window.localStorage`.
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// Open the window's local storage.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl BlobStore for LocalStorageStore {
    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, blob)
            .map_err(|e| StorageError::Io(format!("Failed to write {key}: {e:?}")))
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Io(format!("Failed to read {key}: {e:?}")))
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Io(format!("Failed to delete {key}: {e:?}")))
    }
}
