//! Local-first synchronization policy.
//!
//! # Responsibility
//! - Decide where a collection comes from on load: remote, local, or seed.
//! - Mirror every canonical change to local storage.
//! - Push mutations to the remote source in call order, off the caller's path.
//!
//! # Invariants
//! - Local durability never waits on, or depends on, the remote source.
//! - Remote and storage failures are reported through the failure hook only.

use crate::model::record::RecordKind;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod outbox;
pub mod reconciler;

pub use outbox::RemoteMutation;
pub use reconciler::{LoadOutcome, SyncReconciler};

/// Where the canonical collection was last adopted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// No load has completed yet.
    Unloaded,
    Remote,
    Local,
    Seed,
}

impl LoadOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Remote => "remote",
            Self::Local => "local",
            Self::Seed => "seed",
        }
    }
}

impl Display for LoadOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step of the sync protocol that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    /// Remote `fetch_all` during load.
    Fetch,
    /// Local `load_all` during load (includes corrupt payloads).
    LoadLocal,
    /// Local `save_all` mirroring.
    SaveLocal,
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::LoadLocal => "load_local",
            Self::SaveLocal => "save_local",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the failure came from the remote source.
    pub fn is_remote(self) -> bool {
        !matches!(self, Self::LoadLocal | Self::SaveLocal)
    }
}

/// Diagnostic payload handed to the failure hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub kind: RecordKind,
    pub operation: SyncOperation,
    pub error: String,
}

/// Caller-supplied diagnostics callback. Must not block.
pub type FailureHook = Arc<dyn Fn(&SyncFailure) + Send + Sync>;
