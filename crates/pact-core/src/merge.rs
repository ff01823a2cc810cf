//! Merge engine - pure reconciliation of two record collections

use crate::record::Record;
use std::collections::{HashMap, HashSet};

/// Reconcile a client-submitted collection against the server-held one.
///
/// Server records are indexed by id; client records are then applied in
/// submission order. A client record with an empty id is discarded (not
/// an error). A client record with a known id is merged field-group by
/// field-group: union fields by set union, overwrite fields by
/// client-wins overlay. Unknown ids are inserted verbatim.
///
/// No id present in either input is ever dropped, and the function is
/// idempotent: `merge(s, merge(s, c)) == merge(s, c)`.
///
/// Output order is deterministic: server order first, then new client
/// ids in submission order.
pub fn merge(server: Vec<Record>, client: Vec<Record>) -> Vec<Record> {
    let mut order: Vec<String> = Vec::with_capacity(server.len() + client.len());
    let mut by_id: HashMap<String, Record> = HashMap::with_capacity(server.len() + client.len());

    for record in server {
        if !by_id.contains_key(&record.id) {
            order.push(record.id.clone());
        }
        by_id.insert(record.id.clone(), record);
    }

    for incoming in client {
        if !incoming.has_identity() {
            continue;
        }
        match by_id.get_mut(&incoming.id) {
            Some(existing) => {
                let merged = merge_record(existing, incoming);
                *existing = merged;
            }
            None => {
                order.push(incoming.id.clone());
                by_id.insert(incoming.id.clone(), incoming);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}

/// Merge one client record into its server counterpart
fn merge_record(server: &Record, client: Record) -> Record {
    let mut fields = server.fields.clone();
    // Client wins per key; server-only keys survive
    fields.extend(client.fields);

    Record {
        id: client.id,
        logs: merge_tags(&server.logs, &client.logs),
        failure_logs: merge_tags(&server.failure_logs, &client.failure_logs),
        fields,
    }
}

/// Set union of two tag lists, first-seen order, duplicates collapsed.
///
/// Equality is exact string equality; tags are opaque. If entries ever
/// become structured values they need an explicit key before set union
/// stays well-defined.
fn merge_tags(server: &[String], client: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(server.len() + client.len());
    let mut merged = Vec::with_capacity(server.len() + client.len());

    for tag in server.iter().chain(client.iter()) {
        if seen.insert(tag.as_str()) {
            merged.push(tag.clone());
        }
    }

    merged
}
