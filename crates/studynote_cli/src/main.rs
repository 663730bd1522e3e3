//! Command-line probe for the StudyNote core.
//!
//! # Responsibility
//! - Open a workspace from `STUDYNOTE_*` environment variables.
//! - Print collection sizes, load origins and an optional filtered view.
//!
//! Usage: `studynote [search text]`

use std::process::ExitCode;
use std::sync::Arc;
use studynote_core::filter::{self, FilterCriteria};
use studynote_core::{CoreConfig, FailureHook, StudyWorkspace, SyncFailure};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = studynote_core::init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    println!("studynote_core ping={}", studynote_core::ping());
    println!("studynote_core version={}", studynote_core::core_version());

    let hook: FailureHook = Arc::new(|failure: &SyncFailure| {
        eprintln!(
            "sync degraded: kind={} op={} error={}",
            failure.kind,
            failure.operation.as_str(),
            failure.error
        );
    });
    let workspace = match StudyWorkspace::open(&config, Some(hook)).await {
        Ok(workspace) => workspace,
        Err(err) => {
            eprintln!("remote error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let notes = workspace.notes.snapshot();
    let timetable = workspace.timetable.snapshot();
    println!(
        "storage={}",
        if workspace.is_durable() { "sqlite" } else { "memory" }
    );
    println!("notes count={} origin={}", notes.len(), notes.origin);
    println!("timetable count={} origin={}", timetable.len(), timetable.origin);

    let search = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let criteria = FilterCriteria::new().with_search(search);
    if !criteria.is_empty() {
        for note in filter::apply(&notes.records, &criteria) {
            println!("note id={} course={} title={}", note.id, note.course, note.title);
        }
        for entry in filter::apply(&timetable.records, &criteria) {
            println!(
                "entry id={} day={} start={} title={}",
                entry.id, entry.day, entry.start_time, entry.title
            );
        }
    } else {
        for note in filter::recent(&notes.records, 0) {
            println!("recent id={} title={}", note.id, note.title);
        }
    }

    ExitCode::SUCCESS
}
