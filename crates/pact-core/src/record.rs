//! Record types - the reconciled unit of client state

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A client's reconciled unit of state, keyed by `id`.
///
/// A record carries two disjoint field groups:
/// - *union fields* (`logs`, `failureLogs`): opaque string tags merged by
///   set union, so a sync can never lose a previously recorded entry;
/// - *overwrite fields* (everything else): merged latest-write-wins, the
///   server value retained only when the client omits the key.
///
/// The overwrite-field set is open. Unknown fields submitted by newer
/// clients land in `fields` via `#[serde(flatten)]` and merge correctly
/// without code changes here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Identity. Two records with the same id denote the same logical
    /// entity at different points in time. Empty means "no identity".
    #[serde(default)]
    pub id: String,

    /// Achievement log entries (union field)
    #[serde(default)]
    pub logs: Vec<String>,

    /// Failure log entries (union field)
    #[serde(default)]
    pub failure_logs: Vec<String>,

    /// Open bag of overwrite fields (title, reason, deadline, ...),
    /// not interpreted by the merge engine
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record with the given identity
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            logs: Vec::new(),
            failure_logs: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Whether this record carries an identity.
    ///
    /// Records without one are discarded by the merge engine rather than
    /// treated as errors.
    pub fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }
}
