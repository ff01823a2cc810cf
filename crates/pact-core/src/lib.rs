//! PACT Core - Record Model and Merge Engine
//!
//! This crate provides the core functionality for PACT:
//! - The `Record` model: identity, union fields, and an open bag of
//!   overwrite fields
//! - The pure merge engine reconciling a client collection against the
//!   server-held collection

pub mod merge;
pub mod record;

pub use merge::merge;
pub use record::Record;
