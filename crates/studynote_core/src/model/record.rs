//! Shared record contract for every collection owned by an entity store.
//!
//! # Responsibility
//! - Define the opaque identifier and record-kind addressing.
//! - Define the draft -> record lifecycle every kind must implement.
//! - Report validation failures with every offending field named.
//!
//! # Invariants
//! - `RecordId` values are generated by the store, never by callers.
//! - A record accepted by the store always passes `Record::validate()`.
//! - `Record::apply_draft` keeps immutable fields (`id`, creation time).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Opaque record identifier.
///
/// Generated ids are UUIDv4 strings, but ids adopted from the remote source
/// or local cache are kept verbatim and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record kinds managed by the core. Each kind is an independent collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Notes,
    Timetable,
}

impl RecordKind {
    /// Fixed local storage key. Kinds never share a key.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Timetable => "timetable",
        }
    }

    /// Remote collection path segment.
    pub fn remote_path(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Timetable => "timetable",
        }
    }

    /// Stable name used in log lines.
    pub fn as_str(self) -> &'static str {
        self.storage_key()
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: &'static str,
}

/// Validation failure naming every missing or invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one rejected field.
    pub fn push(&mut self, field: &'static str, reason: &'static str) {
        self.fields.push(FieldError { field, reason });
    }

    /// Checks that `value` has non-whitespace content.
    pub fn require_text(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Returns whether `field` was rejected.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|entry| entry.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the accumulated state into a result.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid record: ")?;
        for (index, entry) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{}` {}", entry.field, entry.reason)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Contract shared by notes and timetable entries.
///
/// A kind is created from a `Draft` (caller input without identity), kept in
/// a canonical order, and serialized with serde for storage and transport.
pub trait Record:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Caller-supplied input for create and full-replacement update.
    type Draft: Clone + Debug + Send + Sync;

    const KIND: RecordKind;

    fn id(&self) -> &RecordId;

    /// Validates a draft before it is accepted by the store.
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

    /// Validates an already materialized record (remote or cached input).
    fn validate(&self) -> Result<(), ValidationError>;

    /// Builds a new record from a validated draft.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Builds the full replacement for `self`, keeping immutable fields.
    fn apply_draft(&self, draft: Self::Draft) -> Self;

    /// Canonical collection order. `Equal` keeps insertion order.
    fn canonical_cmp(_left: &Self, _right: &Self) -> Ordering {
        Ordering::Equal
    }

    /// Fixed records adopted when neither remote nor local data exists.
    fn seed() -> Vec<Self>;
}

/// Checks a whole adopted collection: every record valid, ids unique.
///
/// Returns a human-readable description of the first problem found.
pub fn check_collection<T: Record>(records: &[T]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if let Err(err) = record.validate() {
            return Err(format!("record `{}`: {err}", record.id()));
        }
        if !seen.insert(record.id()) {
            return Err(format!("duplicate id `{}`", record.id()));
        }
    }
    Ok(())
}
