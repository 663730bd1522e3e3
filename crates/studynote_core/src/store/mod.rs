//! Canonical in-memory collections, one store per record kind.
//!
//! # Responsibility
//! - Own the only authoritative copy of each kind's collection.
//! - Expose CRUD with synchronous validation/not-found errors.
//! - Publish a new snapshot after every change.
//!
//! # Invariants
//! - Operations on one store are serialized in call order.
//! - Only remote-independent errors reach callers.

use crate::model::record::{RecordId, ValidationError};
use crate::sync::LoadOrigin;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod entity_store;

pub use entity_store::{EntityStore, EntityStoreBuilder};

pub type StoreResult<T> = Result<T, StoreError>;

/// Caller-actionable store failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound(RecordId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Immutable view of a store's collection at one generation.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Bumped on every change to the collection.
    pub generation: u64,
    pub origin: LoadOrigin,
    pub records: Arc<Vec<T>>,
}

impl<T> Snapshot<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
