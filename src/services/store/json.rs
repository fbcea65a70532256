use std::fs;
use std::path::{Path, PathBuf};

use super::memory::{MemoryStore, StoreData};
use crate::error::{Result, StoreError, SyncError};
use crate::services::catalog::write_atomic;

/// A [`MemoryStore`] backed by a JSON file.
pub struct JsonStore {
    path: PathBuf,
    store: MemoryStore,
}

impl JsonStore {
    pub fn open(path: &Path, primary_language: &str) -> Result<Self> {
        let data = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<StoreData>(&raw).map_err(|e| {
                SyncError::Store(StoreError::Persist(format!(
                    "invalid {}: {e}",
                    path.display()
                )))
            })?
        } else {
            StoreData::default()
        };

        tracing::debug!(
            path = %path.display(),
            entities = data.entities.len(),
            records = data.records.len(),
            "opened store"
        );

        Ok(JsonStore {
            path: path.to_path_buf(),
            store: MemoryStore::from_data(primary_language, data),
        })
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.store
    }

    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.store.snapshot())?;
        write_atomic(&self.path, json.as_bytes())
    }
}
