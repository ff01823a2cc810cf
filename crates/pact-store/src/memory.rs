//! In-memory storage backend

use crate::{LoadOutcome, RecordStore, StoreError};
use async_trait::async_trait;
use pact_core::Record;
use parking_lot::RwLock;

/// In-memory storage backend
///
/// Fast, volatile storage suitable for development and tests.
/// Data is lost when the process exits. Reports `Missing` until the
/// first `replace_all`, mirroring a file store that does not exist yet.
pub struct MemoryStore {
    records: RwLock<Option<Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(None),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_all(&self) -> Result<LoadOutcome, StoreError> {
        match &*self.records.read() {
            Some(records) => Ok(LoadOutcome::Records(records.clone())),
            None => Ok(LoadOutcome::Missing),
        }
    }

    async fn replace_all(&self, records: &[Record]) -> Result<(), StoreError> {
        *self.records.write() = Some(records.to_vec());
        Ok(())
    }
}
