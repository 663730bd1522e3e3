//! HTTP implementation of the remote sources.
//!
//! Endpoints:
//! - notes: `GET /notes`, `GET /notes/recent`, `GET /notes/:id`,
//!   `POST /notes/upload` (multipart), `DELETE /notes/:id`
//! - timetable: `GET /timetable`, `POST /timetable`, `PUT /timetable/:id`,
//!   `DELETE /timetable/:id`

use crate::model::note::Note;
use crate::model::record::{check_collection, Record, RecordId};
use crate::model::timetable::TimetableEntry;
use crate::remote::{RemoteError, RemoteResult, RemoteSource};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Shared HTTP plumbing: base URL, timeout and the opaque user token.
#[derive(Clone)]
pub struct HttpRemote {
    base_url: Url,
    client: Client,
    auth_token: Option<String>,
}

impl HttpRemote {
    /// Builds a client for `base_url`.
    ///
    /// `auth_token` is forwarded as a bearer token and never interpreted.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth_token: Option<String>,
    ) -> RemoteResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| RemoteError::InvalidConfig(format!("base url `{base_url}`: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidConfig(format!(
                "base url `{base_url}` cannot carry paths"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RemoteError::InvalidConfig(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidConfig("base url cannot carry paths".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> RemoteResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let builder = self.client.request(method, url);
        Ok(match self.auth_token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends and maps transport failures and non-2xx statuses.
    async fn send(&self, label: &str, builder: RequestBuilder) -> RemoteResult<Response> {
        let started_at = Instant::now();
        let response = builder.send().await.map_err(|err| {
            warn!("event=remote_request module=remote status=error op={label} error={err}");
            RemoteError::Transport(err.to_string())
        })?;

        let status = response.status();
        debug!(
            "event=remote_request module=remote status={} op={label} duration_ms={}",
            status.as_u16(),
            started_at.elapsed().as_millis()
        );
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }

    async fn get_json<R: DeserializeOwned>(&self, label: &str, segments: &[&str]) -> RemoteResult<R> {
        let response = self
            .send(label, self.request(Method::GET, segments)?)
            .await?;
        let body = response
            .text()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| RemoteError::Malformed(err.to_string()))
    }

    async fn fetch_collection<T: Record>(&self) -> RemoteResult<Vec<T>> {
        let path = T::KIND.remote_path();
        let records: Vec<T> = self.get_json("fetch_all", &[path]).await?;
        check_collection(&records).map_err(RemoteError::Malformed)?;
        Ok(records)
    }

    async fn delete_record(&self, path: &str, id: &RecordId) -> RemoteResult<()> {
        self.send("delete", self.request(Method::DELETE, &[path, id.as_str()])?)
            .await?;
        Ok(())
    }
}

/// File bytes to attach to the next upload of one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Remote source for notes.
pub struct NotesRemote {
    http: HttpRemote,
    staged_files: Mutex<HashMap<RecordId, StagedFile>>,
}

impl NotesRemote {
    pub fn new(http: HttpRemote) -> Self {
        Self {
            http,
            staged_files: Mutex::new(HashMap::new()),
        }
    }

    /// Registers file bytes sent with the next upload of note `id`.
    ///
    /// Must happen before the upload is queued; see
    /// `StudyWorkspace::create_note_with_file`. The file is consumed by the
    /// first upload attempt or by a delete of `id`, whatever the outcome.
    pub fn stage_file(&self, id: RecordId, file: StagedFile) {
        if let Ok(mut staged) = self.staged_files.lock() {
            staged.insert(id, file);
        }
    }

    /// Number of files still waiting for an upload.
    pub fn staged_count(&self) -> usize {
        self.staged_files.lock().map(|staged| staged.len()).unwrap_or(0)
    }

    /// `GET /notes/recent`.
    pub async fn fetch_recent(&self) -> RemoteResult<Vec<Note>> {
        let notes: Vec<Note> = self.http.get_json("fetch_recent", &["notes", "recent"]).await?;
        check_collection(&notes).map_err(RemoteError::Malformed)?;
        Ok(notes)
    }

    /// `GET /notes/:id`.
    pub async fn fetch_one(&self, id: &RecordId) -> RemoteResult<Note> {
        let note: Note = self
            .http
            .get_json("fetch_one", &["notes", id.as_str()])
            .await?;
        note.validate()
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        Ok(note)
    }

    fn take_staged(&self, id: &RecordId) -> Option<StagedFile> {
        self.staged_files
            .lock()
            .ok()
            .and_then(|mut staged| staged.remove(id))
    }

    fn upload_form(note: &Note, file: Option<StagedFile>) -> RemoteResult<Form> {
        let tags = serde_json::to_string(&note.tags)
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        let mut form = Form::new()
            .text("id", note.id.to_string())
            .text("title", note.title.clone())
            .text("course", note.course.clone())
            .text("tags", tags);
        if let Some(content) = note.content.as_ref() {
            form = form.text("content", content.clone());
        }
        if let Some(file_ref) = note.file_ref.as_ref() {
            form = form.text("fileRef", file_ref.clone());
        }
        if let Some(file) = file {
            let mut part = Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(mime) = file.mime.as_deref() {
                part = part
                    .mime_str(mime)
                    .map_err(|err| RemoteError::InvalidConfig(err.to_string()))?;
            }
            form = form.part("file", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl RemoteSource<Note> for NotesRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<Note>> {
        self.http.fetch_collection().await
    }

    async fn create(&self, record: &Note) -> RemoteResult<()> {
        let form = Self::upload_form(record, self.take_staged(&record.id))?;
        let builder = self
            .http
            .request(Method::POST, &["notes", "upload"])?
            .multipart(form);
        self.http.send("upload", builder).await?;
        Ok(())
    }

    async fn update(&self, _record: &Note) -> RemoteResult<()> {
        Err(RemoteError::Unsupported("PUT /notes/:id"))
    }

    async fn delete(&self, id: &RecordId) -> RemoteResult<()> {
        self.take_staged(id);
        self.http.delete_record("notes", id).await
    }
}

/// Remote source for timetable entries.
pub struct TimetableRemote {
    http: HttpRemote,
}

impl TimetableRemote {
    pub fn new(http: HttpRemote) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RemoteSource<TimetableEntry> for TimetableRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<TimetableEntry>> {
        self.http.fetch_collection().await
    }

    async fn create(&self, record: &TimetableEntry) -> RemoteResult<()> {
        let builder = self
            .http
            .request(Method::POST, &["timetable"])?
            .json(record);
        self.http.send("create", builder).await?;
        Ok(())
    }

    async fn update(&self, record: &TimetableEntry) -> RemoteResult<()> {
        let builder = self
            .http
            .request(Method::PUT, &["timetable", record.id.as_str()])?
            .json(record);
        self.http.send("update", builder).await?;
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> RemoteResult<()> {
        self.http.delete_record("timetable", id).await
    }
}
