//! SQLite storage backend

use crate::{LoadOutcome, RecordStore, StoreError};
use async_trait::async_trait;
use pact_core::Record;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// SQLite storage backend
///
/// Embedded persistence suitable for single-node deployments.
/// `replace_all` runs delete-and-insert inside one transaction, giving
/// the same all-or-nothing commit discipline as the file backend.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store with the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                body TEXT NOT NULL
            );

            -- Single-row marker distinguishing "never committed" from
            -- "committed an empty collection"
            CREATE TABLE IF NOT EXISTS store_meta (
                id INTEGER PRIMARY KEY CHECK (id = 0),
                committed_at INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn load_all(&self) -> Result<LoadOutcome, StoreError> {
        let conn = self.conn.lock().unwrap();

        let committed: bool = conn
            .query_row("SELECT COUNT(*) FROM store_meta", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n > 0)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if !committed {
            return Ok(LoadOutcome::Missing);
        }

        let mut stmt = conn
            .prepare("SELECT body FROM records ORDER BY position")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for body in bodies {
            let body = body.map_err(|e| StoreError::Database(e.to_string()))?;
            match serde_json::from_str::<Record>(&body) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Ok(LoadOutcome::Corrupt {
                        detail: e.to_string(),
                    })
                }
            }
        }

        Ok(LoadOutcome::Records(records))
    }

    async fn replace_all(&self, records: &[Record]) -> Result<(), StoreError> {
        let mut bodies = Vec::with_capacity(records.len());
        for record in records {
            bodies.push((
                record.id.clone(),
                serde_json::to_string(record)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            ));
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute("DELETE FROM records", [])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        for (position, (id, body)) in bodies.iter().enumerate() {
            tx.execute(
                "INSERT INTO records (position, id, body) VALUES (?1, ?2, ?3)",
                params![position as i64, id, body],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        tx.execute(
            r#"
            INSERT INTO store_meta (id, committed_at)
            VALUES (0, strftime('%s', 'now') * 1000)
            ON CONFLICT(id) DO UPDATE SET committed_at = excluded.committed_at
            "#,
            [],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))
    }
}
