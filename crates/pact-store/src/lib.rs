//! PACT Storage Backends
//!
//! Provides pluggable get-all/replace-all persistence for the record
//! collection:
//! - JSON file (default): single durable resource, atomic replacement
//! - Memory: fast, volatile storage for tests and development
//! - SQLite: embedded persistence
//!
//! The store is a derived cache reconstructible from client syncs, so
//! reads report an explicit [`LoadOutcome`] instead of failing: callers
//! can distinguish "nothing yet" from "data loss" and decide how to
//! degrade.

#[cfg(feature = "json")]
pub mod json;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use pact_core::Record;

/// Persistence abstraction over the record collection.
///
/// Backends expose whole-collection semantics only: the merge engine
/// always works against the full collection, and `replace_all` commits
/// all-or-nothing so a crash can never expose a partial store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the full persisted collection
    async fn load_all(&self) -> Result<LoadOutcome, StoreError>;

    /// Atomically replace the full persisted collection.
    ///
    /// After this returns, the store is entirely `records`; after a
    /// crash mid-call, it is entirely the previous collection. Writers
    /// are mutually exclusive.
    async fn replace_all(&self, records: &[Record]) -> Result<(), StoreError>;
}

/// Outcome of a store read
#[derive(Debug)]
pub enum LoadOutcome {
    /// The persisted collection
    Records(Vec<Record>),
    /// No store resource exists yet
    Missing,
    /// The resource exists but is unreadable or structurally invalid
    Corrupt { detail: String },
}

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub use memory::MemoryStore;

#[cfg(feature = "json")]
pub use json::JsonFileStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
