use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studynote_core::remote::{
    HttpRemote, NotesRemote, RemoteError, RemoteSource, StagedFile, TimetableRemote,
};
use studynote_core::{
    CoreConfig, LoadOrigin, Note, NoteDraft, Record, RecordId, StudyWorkspace, TimetableEntry,
};

#[derive(Debug, Clone, PartialEq)]
struct UploadPart {
    name: String,
    file_name: Option<String>,
    body: String,
}

#[derive(Default)]
struct Seen {
    authorization: Vec<String>,
    uploads: Vec<Vec<UploadPart>>,
    requests: Vec<String>,
    bodies: Vec<serde_json::Value>,
}

type Shared = Arc<Mutex<Seen>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/")
}

fn remote(base_url: &str, token: Option<&str>) -> HttpRemote {
    HttpRemote::new(base_url, Duration::from_secs(5), token.map(str::to_string)).unwrap()
}

async fn list_notes(State(seen): State<Shared>, headers: HeaderMap) -> Json<Vec<Note>> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        seen.lock()
            .unwrap()
            .authorization
            .push(value.to_str().unwrap().to_string());
    }
    Json(Note::seed())
}

async fn upload_note(State(seen): State<Shared>, mut multipart: Multipart) -> StatusCode {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        parts.push(UploadPart {
            name,
            file_name,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    seen.lock().unwrap().uploads.push(parts);
    StatusCode::CREATED
}

async fn delete_note(State(seen): State<Shared>, Path(id): Path<String>) -> StatusCode {
    seen.lock().unwrap().requests.push(format!("DELETE /notes/{id}"));
    StatusCode::NO_CONTENT
}

async fn delete_entry(State(seen): State<Shared>, Path(id): Path<String>) -> StatusCode {
    seen.lock()
        .unwrap()
        .requests
        .push(format!("DELETE /timetable/{id}"));
    StatusCode::NO_CONTENT
}

async fn one_note(Path(id): Path<String>) -> Json<Note> {
    let mut note = Note::seed().remove(1);
    note.id = RecordId::from(id);
    Json(note)
}

async fn create_entry(
    State(seen): State<Shared>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let mut seen = seen.lock().unwrap();
    seen.requests.push("POST /timetable".to_string());
    seen.bodies.push(body);
    StatusCode::CREATED
}

async fn replace_entry(
    State(seen): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let mut seen = seen.lock().unwrap();
    seen.requests.push(format!("PUT /timetable/{id}"));
    seen.bodies.push(body);
    StatusCode::OK
}

fn api(seen: Shared) -> Router {
    Router::new()
        .route("/api/notes", get(list_notes))
        .route("/api/notes/upload", post(upload_note))
        .route("/api/timetable", get(|| async { Json(TimetableEntry::seed()) }).post(create_entry))
        .route("/api/notes/{id}", get(one_note).delete(delete_note))
        .route("/api/timetable/{id}", put(replace_entry).delete(delete_entry))
        .with_state(seen)
}

#[tokio::test]
async fn fetch_all_decodes_collection_and_sends_bearer_token() {
    let seen = Shared::default();
    let base = serve(api(seen.clone())).await;
    let notes = NotesRemote::new(remote(&base, Some("user-token")));

    let fetched = notes.fetch_all().await.unwrap();

    assert_eq!(fetched, Note::seed());
    assert_eq!(seen.lock().unwrap().authorization, vec!["Bearer user-token"]);
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let app = Router::new().route(
        "/api/notes",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database down") }),
    );
    let base = serve(app).await;

    let err = NotesRemote::new(remote(&base, None))
        .fetch_all()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::Status {
            status: 500,
            body: "database down".to_string(),
        }
    );
}

#[tokio::test]
async fn non_collection_body_is_malformed() {
    let app = Router::new().route(
        "/api/timetable",
        get(|| async { Json(serde_json::json!({ "error": "not a list" })) }),
    );
    let base = serve(app).await;

    let err = TimetableRemote::new(remote(&base, None))
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Malformed(_)));
}

#[tokio::test]
async fn closed_port_is_a_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = NotesRemote::new(remote(&format!("http://{addr}/api/"), None))
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}

#[tokio::test]
async fn upload_sends_multipart_fields_and_staged_file_once() {
    let seen = Shared::default();
    let base = serve(api(seen.clone())).await;
    let notes = NotesRemote::new(remote(&base, None));

    let mut note = Note::seed().remove(0);
    note.content = Some("Big-O basics".to_string());
    notes.stage_file(
        note.id.clone(),
        StagedFile {
            file_name: "algorithms.pdf".to_string(),
            mime: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4".to_vec(),
        },
    );

    notes.create(&note).await.unwrap();
    notes.create(&note).await.unwrap();

    let seen = seen.lock().unwrap();
    let first = &seen.uploads[0];
    let field = |name: &str| first.iter().find(|part| part.name == name).cloned();
    assert_eq!(field("id").unwrap().body, note.id.as_str());
    assert_eq!(field("title").unwrap().body, "Introduction to Algorithms");
    assert_eq!(field("course").unwrap().body, "Computer Science");
    let tags: Vec<String> = serde_json::from_str(&field("tags").unwrap().body).unwrap();
    assert_eq!(tags, vec!["algorithms", "cs", "study"]);
    assert_eq!(field("content").unwrap().body, "Big-O basics");
    let file = field("file").unwrap();
    assert_eq!(file.file_name.as_deref(), Some("algorithms.pdf"));
    assert_eq!(file.body, "%PDF-1.4");

    assert!(seen.uploads[1].iter().all(|part| part.name != "file"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn workspace_uploads_carry_file_staged_at_create() {
    let seen = Shared::default();
    let base = serve(api(seen.clone())).await;
    let config = CoreConfig {
        remote_base_url: Some(base),
        ..CoreConfig::in_memory()
    };
    let workspace = StudyWorkspace::open(&config, None).await.unwrap();

    for round in 0..10 {
        let file = StagedFile {
            file_name: format!("board-{round}.png"),
            mime: Some("image/png".to_string()),
            bytes: b"PNG".to_vec(),
        };
        workspace
            .create_note_with_file(NoteDraft::new(format!("Lecture {round}"), "Physics"), file)
            .unwrap();
    }
    workspace.flush_remote().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.uploads.len(), 10);
    for (round, upload) in seen.uploads.iter().enumerate() {
        let file = upload.iter().find(|part| part.name == "file").unwrap();
        assert_eq!(file.file_name, Some(format!("board-{round}.png")));
    }
    assert_eq!(workspace.notes_remote().unwrap().staged_count(), 0);
}

#[tokio::test]
async fn failed_upload_and_delete_release_staged_files() {
    let app = Router::new()
        .route(
            "/api/notes/upload",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        )
        .route(
            "/api/notes/{id}",
            axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
        );
    let base = serve(app).await;
    let notes = NotesRemote::new(remote(&base, None));
    let staged = || StagedFile {
        file_name: "scan.pdf".to_string(),
        mime: None,
        bytes: b"%PDF".to_vec(),
    };

    let note = Note::seed().remove(0);
    notes.stage_file(note.id.clone(), staged());
    assert!(notes.create(&note).await.is_err());
    assert_eq!(notes.staged_count(), 0);

    notes.stage_file(RecordId::from("never-uploaded"), staged());
    notes.delete(&RecordId::from("never-uploaded")).await.unwrap();
    assert_eq!(notes.staged_count(), 0);
}

#[tokio::test]
async fn note_update_has_no_endpoint() {
    let notes = NotesRemote::new(remote("http://127.0.0.1:9/api/", None));
    let err = notes.update(&Note::seed()[0]).await.unwrap_err();
    assert!(matches!(err, RemoteError::Unsupported(_)));
}

#[tokio::test]
async fn timetable_mutations_hit_rest_paths() {
    let seen = Shared::default();
    let base = serve(api(seen.clone())).await;
    let timetable = TimetableRemote::new(remote(&base, None));
    let entry = TimetableEntry::seed().remove(0);

    timetable.create(&entry).await.unwrap();
    timetable.update(&entry).await.unwrap();
    timetable.delete(&entry.id).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.requests,
        vec![
            "POST /timetable".to_string(),
            format!("PUT /timetable/{}", entry.id),
            format!("DELETE /timetable/{}", entry.id),
        ]
    );
    assert_eq!(seen.bodies[0]["startTime"], "09:00");
    assert_eq!(seen.bodies[0]["type"], "class");
    assert_eq!(seen.bodies[1]["id"], entry.id.as_str());
}

#[tokio::test]
async fn fetch_one_and_delete_notes() {
    let seen = Shared::default();
    let base = serve(api(seen.clone())).await;
    let notes = NotesRemote::new(remote(&base, None));

    let fetched = notes.fetch_one(&RecordId::from("n-42")).await.unwrap();
    assert_eq!(fetched.id.as_str(), "n-42");
    assert_eq!(fetched.title, "Calculus Notes");

    notes.delete(&RecordId::from("n-42")).await.unwrap();
    assert_eq!(seen.lock().unwrap().requests, vec!["DELETE /notes/n-42"]);
}

#[tokio::test]
async fn workspace_adopts_remote_collections() {
    let seen = Shared::default();
    let base = serve(api(seen)).await;
    let config = CoreConfig {
        remote_base_url: Some(base),
        ..CoreConfig::in_memory()
    };

    let workspace = StudyWorkspace::open(&config, None).await.unwrap();

    assert!(workspace.notes_remote().is_some());
    assert_eq!(workspace.notes.snapshot().origin, LoadOrigin::Remote);
    assert_eq!(workspace.timetable.snapshot().origin, LoadOrigin::Remote);
    assert_eq!(workspace.timetable.list(), TimetableEntry::seed());
}
