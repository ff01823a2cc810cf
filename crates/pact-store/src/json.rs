//! JSON flat-file storage backend

use crate::{LoadOutcome, RecordStore, StoreError};
use async_trait::async_trait;
use pact_core::Record;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// JSON flat-file storage backend
///
/// The whole collection is persisted as one JSON array of records.
/// Replacement is atomic: the new collection is written to a temporary
/// file in the same directory, flushed to disk, then renamed over the
/// target. A crash mid-write leaves the previously committed file
/// untouched; a partial or corrupt store is never observable.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes writers; at most one replace may be in flight
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the given file path.
    ///
    /// The file is created on the first `replace_all`; until then reads
    /// report `LoadOutcome::Missing`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Temp file in the same directory, so the rename stays on one
    /// filesystem and remains atomic
    fn temp_path(&self) -> PathBuf {
        let name = format!(
            ".{}.{}.tmp",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        self.path.with_file_name(name)
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| StoreError::Io(e.to_string()))?;

        file.write_all(bytes)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        file.sync_all()
            .map_err(|e| StoreError::Io(e.to_string()))?;

        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_all(&self) -> Result<LoadOutcome, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => {
                return Ok(LoadOutcome::Corrupt {
                    detail: e.to_string(),
                })
            }
        };

        match serde_json::from_slice::<Vec<Record>>(&bytes) {
            Ok(records) => Ok(LoadOutcome::Records(records)),
            Err(e) => Ok(LoadOutcome::Corrupt {
                detail: e.to_string(),
            }),
        }
    }

    async fn replace_all(&self, records: &[Record]) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(records).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        self.write_atomic(&bytes)?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Store replaced");
        Ok(())
    }
}
