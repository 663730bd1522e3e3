//! Key-value media: SQLite-backed and in-memory.
//!
//! # Invariants
//! - `put` replaces the whole value for a key atomically.
//! - SQLite connections are migrated before the store is constructed.

use crate::db::{open_db, open_db_in_memory};
use crate::persist::{KeyValueStore, PersistError, PersistResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed medium using the `kv_entries` table.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection returned by `db::open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| PersistError::LockPoisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> PersistResult<()> {
        let conn = self.conn.lock().map_err(|_| PersistError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistResult<()> {
        let conn = self.conn.lock().map_err(|_| PersistError::LockPoisoned)?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local medium; contents vanish with the value.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| PersistError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> PersistResult<()> {
        let mut entries = self.entries.lock().map_err(|_| PersistError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistResult<()> {
        let mut entries = self.entries.lock().map_err(|_| PersistError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}
