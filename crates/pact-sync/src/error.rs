//! Error types for the sync service

use pact_store::StoreError;
use thiserror::Error;

/// Sync error types
///
/// Store reads are recovered locally (degrade to empty), so the only
/// failure a caller can observe is a failed commit. A caller receiving
/// this must not assume any state was persisted.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to persist merged collection: {0}")]
    Commit(#[from] StoreError),
}

/// Result type alias for sync operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;
