//! Load fallback order and mutation mirroring for one record kind.
//!
//! # Responsibility
//! - Run the three-tier load: remote, then local cache, then seed.
//! - Mirror canonical collections to the persistence adapter.
//! - Queue remote pushes on the outbox worker.
//!
//! # Invariants
//! - `fetch` has no side effects besides failure reports; the store decides
//!   whether an outcome is still current before committing it.
//! - A remote or local collection is adopted only if `check_collection` passes.
//! - Seeds are never empty-substituted: a failed load always yields the seed.

use crate::model::record::{check_collection, Record};
use crate::persist::PersistenceAdapter;
use crate::remote::{RemoteError, RemoteSource};
use crate::sync::outbox::{spawn_outbox, OutboxMessage, OutboxSender};
use crate::sync::{FailureHook, LoadOrigin, RemoteMutation, SyncFailure, SyncOperation};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Collection chosen by the load protocol, not yet adopted.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome<T> {
    pub records: Vec<T>,
    pub origin: LoadOrigin,
}

impl<T> LoadOutcome<T> {
    /// Remote and seed collections are written back to local storage on
    /// adoption; local ones already are.
    pub fn needs_mirror(&self) -> bool {
        matches!(self.origin, LoadOrigin::Remote | LoadOrigin::Seed)
    }
}

/// Sync policy for one record kind.
pub struct SyncReconciler<T: Record> {
    persistence: Arc<dyn PersistenceAdapter<T>>,
    remote: Option<Arc<dyn RemoteSource<T>>>,
    outbox: Option<OutboxSender<T>>,
    hook: Option<FailureHook>,
    seed: Vec<T>,
}

impl<T: Record> SyncReconciler<T> {
    /// Builds the reconciler and, with a remote configured, starts its
    /// outbox worker on the current tokio runtime.
    pub fn new(
        persistence: Arc<dyn PersistenceAdapter<T>>,
        remote: Option<Arc<dyn RemoteSource<T>>>,
        hook: Option<FailureHook>,
        seed: Vec<T>,
    ) -> Self {
        let outbox = remote.clone().map(|remote| {
            let hook = hook.clone();
            spawn_outbox(remote, move |failure| report_failure(hook.as_ref(), &failure))
        });
        Self {
            persistence,
            remote,
            outbox,
            hook,
            seed,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Chooses the collection to adopt: remote, else local, else seed.
    pub async fn fetch(&self) -> LoadOutcome<T> {
        if let Some(remote) = self.remote.as_ref() {
            let fetched = remote
                .fetch_all()
                .await
                .and_then(|records| {
                    check_collection(&records).map_err(RemoteError::Malformed)?;
                    Ok(records)
                });
            match fetched {
                Ok(records) => {
                    return LoadOutcome {
                        records,
                        origin: LoadOrigin::Remote,
                    }
                }
                Err(err) => self.report(SyncOperation::Fetch, err.to_string()),
            }
        }

        match self.persistence.load_all() {
            Ok(Some(records)) => {
                return LoadOutcome {
                    records,
                    origin: LoadOrigin::Local,
                }
            }
            Ok(None) => {
                info!(
                    "event=store_load module=sync status=absent kind={} key={}",
                    T::KIND,
                    self.persistence.key()
                );
            }
            Err(err) => self.report(SyncOperation::LoadLocal, err.to_string()),
        }

        LoadOutcome {
            records: self.seed.clone(),
            origin: LoadOrigin::Seed,
        }
    }

    /// Writes `records` to local storage; failures go to the hook.
    pub fn mirror(&self, records: &[T]) {
        if let Err(err) = self.persistence.save_all(records) {
            self.report(SyncOperation::SaveLocal, err.to_string());
        }
    }

    /// Queues a remote push. No-op without a remote source.
    pub fn push(&self, mutation: RemoteMutation<T>) {
        if let Some(outbox) = self.outbox.as_ref() {
            let operation = mutation.operation();
            if outbox.send(OutboxMessage::Push(mutation)).is_err() {
                self.report(operation, "remote outbox worker stopped".to_string());
            }
        }
    }

    /// Resolves once every push queued before this call was attempted.
    pub async fn flush(&self) {
        let Some(outbox) = self.outbox.as_ref() else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if outbox.send(OutboxMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    fn report(&self, operation: SyncOperation, error: String) {
        report_failure(
            self.hook.as_ref(),
            &SyncFailure {
                kind: T::KIND,
                operation,
                error,
            },
        );
    }
}

fn report_failure(hook: Option<&FailureHook>, failure: &SyncFailure) {
    warn!(
        "event=sync_failure module=sync status=degraded kind={} op={} remote={} error={}",
        failure.kind,
        failure.operation.as_str(),
        failure.operation.is_remote(),
        failure.error
    );
    if let Some(hook) = hook {
        hook(failure);
    }
}
