//! Local durable persistence of record collections.
//!
//! # Responsibility
//! - Define the string key-value medium (`KeyValueStore`).
//! - Define the per-kind collection adapter (`PersistenceAdapter`).
//! - Keep storage free of business rules: pure load/save.
//!
//! # Invariants
//! - Each record kind is stored under its own fixed key.
//! - Corrupt payloads are reported as errors, never silently dropped.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod json_collection;
pub mod kv;

pub use json_collection::{JsonCollectionStore, STORAGE_FORMAT_VERSION};
pub use kv::{MemoryKeyValueStore, SqliteKeyValueStore};

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug)]
pub enum PersistError {
    Db(DbError),
    /// Stored payload could not be decoded into the collection shape.
    Corrupt { key: String, message: String },
    /// Stored payload was written by a newer storage format.
    UnsupportedVersion {
        key: String,
        version: u32,
        latest_supported: u32,
    },
    Encode(serde_json::Error),
    /// A writer panicked while holding the storage lock.
    LockPoisoned,
}

impl PersistError {
    /// Whether the stored value exists but cannot be used.
    ///
    /// Callers treat these exactly like an absent value.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. } | Self::UnsupportedVersion { .. })
    }
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Corrupt { key, message } => {
                write!(f, "stored collection `{key}` is corrupt: {message}")
            }
            Self::UnsupportedVersion {
                key,
                version,
                latest_supported,
            } => write!(
                f,
                "stored collection `{key}` has format version {version}, newer than supported {latest_supported}"
            ),
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
            Self::LockPoisoned => f.write_str("storage lock poisoned"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string key-value medium.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PersistResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> PersistResult<()>;
    fn remove(&self, key: &str) -> PersistResult<()>;
}

/// Whole-collection persistence for one record kind.
pub trait PersistenceAdapter<T>: Send + Sync {
    /// Storage key this adapter owns.
    fn key(&self) -> &str;

    /// Loads the stored collection, `None` when nothing was ever saved.
    fn load_all(&self) -> PersistResult<Option<Vec<T>>>;

    /// Replaces the stored collection.
    fn save_all(&self, records: &[T]) -> PersistResult<()>;
}
