//! Wiring of storage, remote clients and the two entity stores.
//!
//! # Invariants
//! - Both kinds share one key-value medium under separate keys.
//! - A storage medium that cannot be opened degrades to memory, never fails.

use crate::config::CoreConfig;
use crate::model::note::{Note, NoteDraft};
use crate::model::record::RecordKind;
use crate::model::timetable::TimetableEntry;
use crate::persist::{JsonCollectionStore, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
use crate::remote::{HttpRemote, NotesRemote, RemoteResult, StagedFile, TimetableRemote};
use crate::store::{EntityStore, StoreResult};
use crate::sync::{FailureHook, SyncFailure, SyncOperation};
use log::{info, warn};
use std::sync::Arc;

/// Both record stores of one signed-in user.
pub struct StudyWorkspace {
    pub notes: EntityStore<Note>,
    pub timetable: EntityStore<TimetableEntry>,
    notes_remote: Option<Arc<NotesRemote>>,
    durable: bool,
}

impl StudyWorkspace {
    /// Opens storage, builds remote clients and loads both collections.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    /// - Returns an error when the remote client cannot be built from config.
    pub async fn open(config: &CoreConfig, hook: Option<FailureHook>) -> RemoteResult<Self> {
        let (kv, durable) = open_storage(config, hook.as_ref());

        let http = config
            .remote_base_url
            .as_deref()
            .map(|url| HttpRemote::new(url, config.request_timeout, config.auth_token.clone()))
            .transpose()?;
        let notes_remote = http.clone().map(|http| Arc::new(NotesRemote::new(http)));
        let timetable_remote = http.map(|http| Arc::new(TimetableRemote::new(http)));

        let mut notes = EntityStore::builder(Arc::new(JsonCollectionStore::<Note>::new(
            Arc::clone(&kv),
        )));
        let mut timetable = EntityStore::builder(Arc::new(
            JsonCollectionStore::<TimetableEntry>::new(kv),
        ));
        if let Some(remote) = notes_remote.clone() {
            notes = notes.remote(remote);
        }
        if let Some(remote) = timetable_remote {
            timetable = timetable.remote(remote);
        }
        if let Some(hook) = hook {
            notes = notes.failure_hook(Arc::clone(&hook));
            timetable = timetable.failure_hook(hook);
        }

        let (notes, timetable) = tokio::join!(notes.open(), timetable.open());
        info!(
            "event=workspace_open module=workspace status=ok durable={} remote={} notes={} timetable={}",
            durable,
            notes_remote.is_some(),
            notes.snapshot().len(),
            timetable.snapshot().len()
        );

        Ok(Self {
            notes,
            timetable,
            notes_remote,
            durable,
        })
    }

    /// Creates a note whose upload carries `file`.
    ///
    /// The file is staged before the upload is queued. Without a remote the
    /// note is stored locally and the file is dropped.
    pub fn create_note_with_file(&self, draft: NoteDraft, file: StagedFile) -> StoreResult<Note> {
        match self.notes_remote.as_deref() {
            Some(remote) => self
                .notes
                .create_with(draft, |note| remote.stage_file(note.id.clone(), file)),
            None => self.notes.create(draft),
        }
    }

    /// Notes remote client, for note-only endpoints.
    pub fn notes_remote(&self) -> Option<&NotesRemote> {
        self.notes_remote.as_deref()
    }

    /// Whether collections survive a restart.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Waits for queued remote pushes of both stores.
    pub async fn flush_remote(&self) {
        tokio::join!(self.notes.flush_remote(), self.timetable.flush_remote());
    }
}

fn open_storage(
    config: &CoreConfig,
    hook: Option<&FailureHook>,
) -> (Arc<dyn KeyValueStore>, bool) {
    let Some(path) = config.db_path() else {
        return (Arc::new(MemoryKeyValueStore::new()), false);
    };

    match SqliteKeyValueStore::open(&path) {
        Ok(store) => (Arc::new(store), true),
        Err(err) => {
            warn!(
                "event=storage_open module=workspace status=degraded path={} error={}",
                path.display(),
                err
            );
            if let Some(hook) = hook {
                for kind in [RecordKind::Notes, RecordKind::Timetable] {
                    hook(&SyncFailure {
                        kind,
                        operation: SyncOperation::LoadLocal,
                        error: err.to_string(),
                    });
                }
            }
            (Arc::new(MemoryKeyValueStore::new()), false)
        }
    }
}
