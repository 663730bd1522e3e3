//! Remote source of truth for record collections.
//!
//! # Responsibility
//! - Define the async contract the sync layer pushes to and pulls from.
//! - Classify every remote failure as "remote unavailable".
//!
//! # Invariants
//! - Remote errors never reach store callers; the sync layer absorbs them.
//! - Fetched collections are validated before they are handed out.

use crate::model::record::{Record, RecordId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod http;

pub use http::{HttpRemote, NotesRemote, StagedFile, TimetableRemote};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Every way the remote source can be unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection, timeout or protocol failure.
    Transport(String),
    /// Non-2xx response.
    Status { status: u16, body: String },
    /// 2xx response whose body does not match the record shape.
    Malformed(String),
    /// The remote contract has no endpoint for this operation.
    Unsupported(&'static str),
    InvalidConfig(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "remote transport failure: {message}"),
            Self::Status { status, body } => write!(f, "remote returned HTTP {status}: {body}"),
            Self::Malformed(message) => write!(f, "remote response malformed: {message}"),
            Self::Unsupported(operation) => {
                write!(f, "remote does not support `{operation}`")
            }
            Self::InvalidConfig(message) => write!(f, "invalid remote configuration: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Network-backed source for one record kind.
#[async_trait]
pub trait RemoteSource<T: Record>: Send + Sync {
    /// Fetches the full authoritative collection.
    async fn fetch_all(&self) -> RemoteResult<Vec<T>>;

    async fn create(&self, record: &T) -> RemoteResult<()>;

    async fn update(&self, record: &T) -> RemoteResult<()>;

    async fn delete(&self, id: &RecordId) -> RemoteResult<()>;
}
