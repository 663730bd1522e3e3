//! Local-first data core for StudyNote.
//! Owns the note and timetable collections, their sync policy and filtering.

pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod persist;
pub mod remote;
pub mod store;
pub mod sync;
pub mod workspace;

pub use config::{ConfigError, CoreConfig};
pub use filter::{FilterChoices, FilterCriteria, FilterIndex, Filterable};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDraft};
pub use model::preview::NotePreview;
pub use model::record::{Record, RecordId, RecordKind, ValidationError};
pub use model::timetable::{Day, EntryType, TimeOfDay, TimetableDraft, TimetableEntry, TimetableForm};
pub use persist::{JsonCollectionStore, KeyValueStore, PersistError, PersistenceAdapter};
pub use remote::{RemoteError, RemoteSource};
pub use store::{EntityStore, Snapshot, StoreError, StoreResult};
pub use sync::{FailureHook, LoadOrigin, SyncFailure, SyncOperation};
pub use workspace::StudyWorkspace;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
