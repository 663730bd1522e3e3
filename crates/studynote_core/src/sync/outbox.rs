//! FIFO queue of remote pushes for one store.

use crate::model::record::{Record, RecordId};
use crate::remote::{RemoteResult, RemoteSource};
use crate::sync::{SyncFailure, SyncOperation};
use log::debug;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One mutation to replay against the remote source.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteMutation<T> {
    Create(T),
    Update(T),
    Delete(RecordId),
}

impl<T> RemoteMutation<T> {
    pub fn operation(&self) -> SyncOperation {
        match self {
            Self::Create(_) => SyncOperation::Create,
            Self::Update(_) => SyncOperation::Update,
            Self::Delete(_) => SyncOperation::Delete,
        }
    }
}

pub(crate) enum OutboxMessage<T> {
    Push(RemoteMutation<T>),
    /// Acknowledged once every earlier push has been attempted.
    Flush(oneshot::Sender<()>),
}

pub(crate) type OutboxSender<T> = mpsc::UnboundedSender<OutboxMessage<T>>;

/// Spawns the worker draining pushes in order. Ends when the sender drops.
pub(crate) fn spawn_outbox<T: Record>(
    remote: Arc<dyn RemoteSource<T>>,
    report: impl Fn(SyncFailure) + Send + 'static,
) -> OutboxSender<T> {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboxMessage<T>>();
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                OutboxMessage::Push(mutation) => {
                    let operation = mutation.operation();
                    if let Err(err) = push_one(remote.as_ref(), &mutation).await {
                        report(SyncFailure {
                            kind: T::KIND,
                            operation,
                            error: err.to_string(),
                        });
                    } else {
                        debug!(
                            "event=remote_push module=sync status=ok kind={} op={}",
                            T::KIND,
                            operation.as_str()
                        );
                    }
                }
                OutboxMessage::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    });
    tx
}

async fn push_one<T: Record>(
    remote: &dyn RemoteSource<T>,
    mutation: &RemoteMutation<T>,
) -> RemoteResult<()> {
    match mutation {
        RemoteMutation::Create(record) => remote.create(record).await,
        RemoteMutation::Update(record) => remote.update(record).await,
        RemoteMutation::Delete(id) => remote.delete(id).await,
    }
}
