//! PACT Sync Service
//!
//! Orchestrates one sync call: load the server collection, merge the
//! client submission into it, persist the result atomically, and return
//! the merged collection so the client converges on server state.

pub mod error;
pub mod service;

pub use error::{SyncError, SyncResult};
pub use service::SyncService;
