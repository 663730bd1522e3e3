//! Entity store: canonical collection plus CRUD for one record kind.
//!
//! # Invariants
//! - The collection is kept in `Record::canonical_cmp` order (stable).
//! - Every accepted mutation bumps the generation, mirrors to local storage,
//!   queues a remote push and publishes a snapshot, all under one lock.
//! - A load outcome is adopted only if no mutation or newer load started
//!   after it was issued.
//! - A load fetches only after every push queued before it was attempted.
//! - Identifiers handed out are never reused within the store's lifetime.

use crate::model::record::{Record, RecordId, RecordKind};
use crate::persist::PersistenceAdapter;
use crate::remote::RemoteSource;
use crate::store::{Snapshot, StoreError, StoreResult};
use crate::sync::{FailureHook, LoadOrigin, RemoteMutation, SyncFailure, SyncReconciler};
use chrono::Utc;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

struct StoreState<T> {
    records: Arc<Vec<T>>,
    generation: u64,
    origin: LoadOrigin,
    /// Ids deleted during this session; never generated again.
    retired: HashSet<RecordId>,
}

impl<T: Record> StoreState<T> {
    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            generation: self.generation,
            origin: self.origin,
            records: Arc::clone(&self.records),
        }
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    fn fresh_id(&self) -> RecordId {
        loop {
            let candidate = RecordId::generate();
            if !self.retired.contains(&candidate) && self.position(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn records_mut(&mut self) -> &mut Vec<T> {
        Arc::make_mut(&mut self.records)
    }
}

struct StoreInner<T: Record> {
    state: Mutex<StoreState<T>>,
    reconciler: SyncReconciler<T>,
    snapshots: watch::Sender<Snapshot<T>>,
}

/// Single owner of one record kind's canonical collection.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct EntityStore<T: Record> {
    inner: Arc<StoreInner<T>>,
}

impl<T: Record> EntityStore<T> {
    pub fn builder(persistence: Arc<dyn PersistenceAdapter<T>>) -> EntityStoreBuilder<T> {
        EntityStoreBuilder {
            persistence,
            remote: None,
            seed: None,
            hook: None,
        }
    }

    pub fn kind(&self) -> RecordKind {
        T::KIND
    }

    /// Current canonical collection.
    pub fn list(&self) -> Vec<T> {
        self.lock_state().records.as_ref().clone()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.lock_state().snapshot()
    }

    /// Receives a new snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.inner.snapshots.subscribe()
    }

    pub fn get(&self, id: &RecordId) -> StoreResult<T> {
        let state = self.lock_state();
        state
            .position(id)
            .map(|index| state.records[index].clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Validates `draft`, assigns a fresh id, and stores the new record.
    pub fn create(&self, draft: T::Draft) -> StoreResult<T> {
        self.create_with(draft, |_| {})
    }

    /// Like `create`, but runs `before_push` on the new record before its
    /// remote push is queued.
    pub fn create_with(&self, draft: T::Draft, before_push: impl FnOnce(&T)) -> StoreResult<T> {
        T::validate_draft(&draft)?;
        let mut state = self.lock_state();
        let record = T::from_draft(state.fresh_id(), draft, Utc::now());

        let records = state.records_mut();
        records.push(record.clone());
        records.sort_by(T::canonical_cmp);

        before_push(&record);
        self.commit(&mut state, RemoteMutation::Create(record.clone()));
        Ok(record)
    }

    /// Replaces the whole record `id` with the result of `draft`.
    pub fn update(&self, id: &RecordId, draft: T::Draft) -> StoreResult<T> {
        T::validate_draft(&draft)?;
        let mut state = self.lock_state();
        let index = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let record = state.records[index].apply_draft(draft);

        let records = state.records_mut();
        records[index] = record.clone();
        records.sort_by(T::canonical_cmp);

        self.commit(&mut state, RemoteMutation::Update(record.clone()));
        Ok(record)
    }

    /// Removes `id` if present. Returns whether anything was removed.
    ///
    /// Deleting an absent id changes nothing and writes nothing.
    pub fn delete(&self, id: &RecordId) -> bool {
        let mut state = self.lock_state();
        let Some(index) = state.position(id) else {
            debug!(
                "event=store_mutation module=store status=noop kind={} op=delete",
                T::KIND
            );
            return false;
        };

        state.records_mut().remove(index);
        state.retired.insert(id.clone());
        self.commit(&mut state, RemoteMutation::Delete(id.clone()));
        true
    }

    /// Runs the load protocol and adopts its outcome if still current.
    ///
    /// Returns the adopted origin, or `None` when a mutation or a newer load
    /// superseded this one while it was in flight.
    pub async fn reload(&self) -> Option<LoadOrigin> {
        let issued_at = {
            let mut state = self.lock_state();
            state.generation += 1;
            state.generation
        };

        // Earlier pushes must land before the remote is read back.
        self.inner.reconciler.flush().await;
        let outcome = self.inner.reconciler.fetch().await;

        let mut state = self.lock_state();
        if state.generation != issued_at {
            info!(
                "event=store_load module=store status=stale kind={} issued_generation={} current_generation={}",
                T::KIND,
                issued_at,
                state.generation
            );
            return None;
        }

        let needs_mirror = outcome.needs_mirror();
        let origin = outcome.origin;
        let mut records = outcome.records;
        records.sort_by(T::canonical_cmp);

        state.records = Arc::new(records);
        state.origin = origin;
        state.generation += 1;
        if needs_mirror {
            self.inner.reconciler.mirror(&state.records);
        }
        self.inner.snapshots.send_replace(state.snapshot());

        info!(
            "event=store_load module=store status=ok kind={} origin={} count={} generation={}",
            T::KIND,
            origin,
            state.records.len(),
            state.generation
        );
        Some(origin)
    }

    /// Waits until every remote push queued so far has been attempted.
    pub async fn flush_remote(&self) {
        self.inner.reconciler.flush().await;
    }

    fn commit(&self, state: &mut StoreState<T>, mutation: RemoteMutation<T>) {
        state.generation += 1;
        self.inner.reconciler.mirror(&state.records);
        let operation = mutation.operation();
        self.inner.reconciler.push(mutation);
        self.inner.snapshots.send_replace(state.snapshot());
        debug!(
            "event=store_mutation module=store status=ok kind={} op={} generation={} count={}",
            T::KIND,
            operation.as_str(),
            state.generation,
            state.records.len()
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configures and opens an `EntityStore`.
pub struct EntityStoreBuilder<T: Record> {
    persistence: Arc<dyn PersistenceAdapter<T>>,
    remote: Option<Arc<dyn RemoteSource<T>>>,
    seed: Option<Vec<T>>,
    hook: Option<FailureHook>,
}

impl<T: Record> EntityStoreBuilder<T> {
    pub fn remote(mut self, remote: Arc<dyn RemoteSource<T>>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Overrides `Record::seed()`.
    pub fn seed(mut self, seed: Vec<T>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn on_failure(self, hook: impl Fn(&SyncFailure) + Send + Sync + 'static) -> Self {
        self.failure_hook(Arc::new(hook))
    }

    /// Shares one hook between stores.
    pub fn failure_hook(mut self, hook: FailureHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Builds the store and runs the initial load. Never fails: the worst
    /// case is an in-memory store holding the seed.
    ///
    /// Must be called within a tokio runtime.
    pub async fn open(self) -> EntityStore<T> {
        let seed = self.seed.unwrap_or_else(T::seed);
        let reconciler = SyncReconciler::new(self.persistence, self.remote, self.hook, seed);
        let state = StoreState {
            records: Arc::new(Vec::new()),
            generation: 0,
            origin: LoadOrigin::Unloaded,
            retired: HashSet::new(),
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        let store = EntityStore {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                reconciler,
                snapshots,
            }),
        };
        store.reload().await;
        store
    }
}
