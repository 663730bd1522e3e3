#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studynote_core::remote::{RemoteError, RemoteResult, RemoteSource};
use studynote_core::sync::RemoteMutation;
use studynote_core::{FailureHook, Record, RecordId, SyncFailure};
use tokio::sync::Notify;

/// In-process remote with a fixed fetch answer and a push log.
pub struct ScriptedRemote<T> {
    fetch_answer: Mutex<RemoteResult<Vec<T>>>,
    fail_pushes: AtomicBool,
    pushes: Mutex<Vec<RemoteMutation<T>>>,
    hold_next_fetch: AtomicBool,
    fetch_entered: Notify,
    fetch_released: Notify,
    /// When set, pushes sleep this long and then apply to the served collection.
    apply_delay: Mutex<Option<Duration>>,
}

impl<T: Record> ScriptedRemote<T> {
    fn with_answer(answer: RemoteResult<Vec<T>>) -> Arc<Self> {
        Arc::new(Self {
            fetch_answer: Mutex::new(answer),
            fail_pushes: AtomicBool::new(false),
            pushes: Mutex::new(Vec::new()),
            hold_next_fetch: AtomicBool::new(false),
            fetch_entered: Notify::new(),
            fetch_released: Notify::new(),
            apply_delay: Mutex::new(None),
        })
    }

    /// Every call fails as unreachable.
    pub fn unreachable() -> Arc<Self> {
        let remote = Self::with_answer(Err(offline()));
        remote.fail_pushes.store(true, Ordering::SeqCst);
        remote
    }

    pub fn serving(records: Vec<T>) -> Arc<Self> {
        Self::with_answer(Ok(records))
    }

    pub fn set_answer(&self, answer: RemoteResult<Vec<T>>) {
        *self.fetch_answer.lock().unwrap() = answer;
    }

    /// Behaves like a slow server: each push takes `delay` before it shows
    /// up in later fetches.
    pub fn apply_pushes_after(&self, delay: Duration) {
        *self.apply_delay.lock().unwrap() = Some(delay);
    }

    pub fn pushes(&self) -> Vec<RemoteMutation<T>> {
        self.pushes.lock().unwrap().clone()
    }

    /// Makes the next `fetch_all` wait for `release_fetch`.
    pub fn hold_next_fetch(&self) {
        self.hold_next_fetch.store(true, Ordering::SeqCst);
    }

    pub async fn fetch_started(&self) {
        self.fetch_entered.notified().await;
    }

    pub fn release_fetch(&self) {
        self.fetch_released.notify_one();
    }

    async fn log_push(&self, mutation: RemoteMutation<T>) -> RemoteResult<()> {
        let delay = *self.apply_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
            self.apply(&mutation);
        }
        self.pushes.lock().unwrap().push(mutation);
        if self.fail_pushes.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            Ok(())
        }
    }

    fn apply(&self, mutation: &RemoteMutation<T>) {
        let mut answer = self.fetch_answer.lock().unwrap();
        let Ok(records) = answer.as_mut() else {
            return;
        };
        match mutation {
            RemoteMutation::Create(record) => records.push(record.clone()),
            RemoteMutation::Update(record) => {
                if let Some(slot) = records.iter_mut().find(|r| r.id() == record.id()) {
                    *slot = record.clone();
                }
            }
            RemoteMutation::Delete(id) => records.retain(|r| r.id() != id),
        }
    }
}

#[async_trait]
impl<T: Record> RemoteSource<T> for ScriptedRemote<T> {
    async fn fetch_all(&self) -> RemoteResult<Vec<T>> {
        if self.hold_next_fetch.swap(false, Ordering::SeqCst) {
            self.fetch_entered.notify_one();
            self.fetch_released.notified().await;
        }
        self.fetch_answer.lock().unwrap().clone()
    }

    async fn create(&self, record: &T) -> RemoteResult<()> {
        self.log_push(RemoteMutation::Create(record.clone())).await
    }

    async fn update(&self, record: &T) -> RemoteResult<()> {
        self.log_push(RemoteMutation::Update(record.clone())).await
    }

    async fn delete(&self, id: &RecordId) -> RemoteResult<()> {
        self.log_push(RemoteMutation::Delete(id.clone())).await
    }
}

fn offline() -> RemoteError {
    RemoteError::Transport("connection refused".to_string())
}

/// Hook that records every failure it receives.
pub fn recording_hook() -> (FailureHook, Arc<Mutex<Vec<SyncFailure>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let hook: FailureHook = Arc::new(move |failure: &SyncFailure| {
        sink.lock().unwrap().push(failure.clone());
    });
    (hook, seen)
}
