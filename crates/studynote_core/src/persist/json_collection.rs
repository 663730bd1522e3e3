//! JSON collection adapter over a key-value medium.
//!
//! # Responsibility
//! - Serialize one record kind's full collection under its fixed key.
//! - Tag written payloads with a format version for future migration.
//!
//! # Invariants
//! - Written payloads are `{"version": N, "records": [...]}`.
//! - A bare JSON array is read as the current shape.
//! - Every loaded collection passes `check_collection` or is reported corrupt.

use crate::model::record::{check_collection, Record};
use crate::persist::{KeyValueStore, PersistError, PersistResult, PersistenceAdapter};
use log::debug;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// Current storage format version.
pub const STORAGE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    records: &'a [T],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPayload<T> {
    Versioned { version: u32, records: Vec<T> },
    Unversioned(Vec<T>),
}

/// Persists `Vec<T>` as JSON under `T::KIND.storage_key()`.
pub struct JsonCollectionStore<T> {
    kv: Arc<dyn KeyValueStore>,
    key: &'static str,
    _records: PhantomData<fn() -> T>,
}

impl<T: Record> JsonCollectionStore<T> {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            key: T::KIND.storage_key(),
            _records: PhantomData,
        }
    }

    /// Removes the stored collection so the next load reports absence.
    pub fn clear(&self) -> PersistResult<()> {
        self.kv.remove(self.key)
    }

    fn corrupt(&self, message: impl Into<String>) -> PersistError {
        PersistError::Corrupt {
            key: self.key.to_string(),
            message: message.into(),
        }
    }
}

impl<T: Record> PersistenceAdapter<T> for JsonCollectionStore<T> {
    fn key(&self) -> &str {
        self.key
    }

    fn load_all(&self) -> PersistResult<Option<Vec<T>>> {
        let Some(raw) = self.kv.get(self.key)? else {
            return Ok(None);
        };

        let payload: StoredPayload<T> =
            serde_json::from_str(&raw).map_err(|err| self.corrupt(err.to_string()))?;
        let records = match payload {
            StoredPayload::Versioned { version, records } => {
                if version > STORAGE_FORMAT_VERSION {
                    return Err(PersistError::UnsupportedVersion {
                        key: self.key.to_string(),
                        version,
                        latest_supported: STORAGE_FORMAT_VERSION,
                    });
                }
                records
            }
            StoredPayload::Unversioned(records) => {
                debug!(
                    "event=collection_load module=persist status=ok key={} format=unversioned",
                    self.key
                );
                records
            }
        };

        check_collection(&records).map_err(|message| self.corrupt(message))?;
        Ok(Some(records))
    }

    fn save_all(&self, records: &[T]) -> PersistResult<()> {
        let encoded = serde_json::to_string(&EnvelopeRef {
            version: STORAGE_FORMAT_VERSION,
            records,
        })
        .map_err(PersistError::Encode)?;
        self.kv.put(self.key, &encoded)
    }
}
