//! Study note record.
//!
//! # Responsibility
//! - Define the note shape shared by storage, transport and views.
//! - Validate note drafts and build records from them.
//!
//! # Invariants
//! - `title` and `course` are non-empty once accepted.
//! - `tags` is a case-sensitive set without blank values.
//! - `id` and `upload_date` never change after creation.

use crate::model::preview::NotePreview;
use crate::model::record::{Record, RecordId, RecordKind, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One uploaded study note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: RecordId,
    pub title: String,
    /// Exact-match facet value.
    pub course: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(with = "upload_date")]
    pub upload_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Reference to a binary asset owned by the upload collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
}

impl Note {
    /// Derives the card preview from the body and attachment.
    pub fn preview(&self) -> NotePreview {
        NotePreview::derive(self.content.as_deref(), self.file_ref.as_deref())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Caller input for creating or fully replacing a note.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteDraft {
    pub title: String,
    pub course: String,
    pub tags: Vec<String>,
    pub content: Option<String>,
    pub file_ref: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, course: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course: course.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets tags from comma-separated form input such as `"cs, study"`.
    pub fn with_tag_list(mut self, raw: &str) -> Self {
        self.tags = parse_tag_list(raw);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_file_ref(mut self, file_ref: impl Into<String>) -> Self {
        self.file_ref = Some(file_ref.into());
        self
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            course: note.course.clone(),
            tags: note.tags.iter().cloned().collect(),
            content: note.content.clone(),
            file_ref: note.file_ref.clone(),
        }
    }
}

/// Splits comma-separated tag input, dropping blank entries.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .collect()
}

impl Record for Note {
    type Draft = NoteDraft;

    const KIND: RecordKind = RecordKind::Notes;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &NoteDraft) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        err.require_text("title", &draft.title);
        err.require_text("course", &draft.course);
        if draft.tags.iter().any(|tag| tag.trim().is_empty()) {
            err.push("tags", "must not contain blank values");
        }
        err.into_result()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        err.require_text("id", self.id.as_str());
        err.require_text("title", &self.title);
        err.require_text("course", &self.course);
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            err.push("tags", "must not contain blank values");
        }
        err.into_result()
    }

    fn from_draft(id: RecordId, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            course: draft.course.trim().to_string(),
            tags: normalize_tags(draft.tags),
            upload_date: now,
            content: draft.content,
            file_ref: draft.file_ref,
        }
    }

    fn apply_draft(&self, draft: NoteDraft) -> Self {
        Self::from_draft(self.id.clone(), draft, self.upload_date)
    }

    fn seed() -> Vec<Self> {
        vec![
            seed_note(
                "seed-note-1",
                "Introduction to Algorithms",
                "Computer Science",
                &["algorithms", "cs", "study"],
                (2024, 1, 15),
            ),
            seed_note(
                "seed-note-2",
                "Calculus Notes",
                "Mathematics",
                &["calculus", "math", "derivatives"],
                (2024, 1, 14),
            ),
            seed_note(
                "seed-note-3",
                "Physics Fundamentals",
                "Physics",
                &["physics", "mechanics", "laws"],
                (2024, 1, 13),
            ),
            seed_note(
                "seed-note-4",
                "Data Structures",
                "Computer Science",
                &["data structures", "cs", "programming"],
                (2024, 1, 12),
            ),
            seed_note(
                "seed-note-5",
                "Linear Algebra",
                "Mathematics",
                &["linear algebra", "math", "vectors"],
                (2024, 1, 11),
            ),
        ]
    }
}

fn seed_note(
    id: &str,
    title: &str,
    course: &str,
    tags: &[&str],
    (year, month, day): (i32, u32, u32),
) -> Note {
    Note {
        id: RecordId::from(id),
        title: title.to_string(),
        course: course.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        upload_date: midnight_utc(year, month, day),
        content: None,
        file_ref: None,
    }
}

fn midnight_utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

/// `uploadDate` codec: writes RFC 3339, reads RFC 3339 or a bare date.
mod upload_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw.trim()) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid uploadDate `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_tag_list, Note, NoteDraft};
    use crate::model::record::{Record, RecordId};
    use chrono::{Datelike, Utc};

    #[test]
    fn parse_tag_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_tag_list(" algorithms, cs ,, study ,"),
            vec!["algorithms", "cs", "study"]
        );
        assert!(parse_tag_list("  ").is_empty());
    }

    #[test]
    fn draft_validation_names_missing_fields() {
        let err = Note::validate_draft(&NoteDraft::new(" ", "")).unwrap_err();
        assert!(err.has_field("title"));
        assert!(err.has_field("course"));

        let err = Note::validate_draft(&NoteDraft::new("Calc", "MATH201").with_tags(["ok", " "]))
            .unwrap_err();
        assert!(err.has_field("tags"));
        assert!(!err.has_field("title"));
    }

    #[test]
    fn preview_uses_content_and_image_attachment() {
        let draft = NoteDraft::new("Optics", "Physics")
            .with_content("**Snell's law** relates angles")
            .with_file_ref("uploads/prism.png");
        let note = Note::from_draft(RecordId::generate(), draft, Utc::now());

        let preview = note.preview();
        assert_eq!(preview.text.as_deref(), Some("Snell's law relates angles"));
        assert_eq!(preview.thumbnail.as_deref(), Some("uploads/prism.png"));
    }

    #[test]
    fn tags_are_deduplicated_case_sensitively() {
        let draft = NoteDraft::new("Calc", "MATH201").with_tags(["math", "Math", "math "]);
        let note = Note::from_draft(RecordId::generate(), draft, Utc::now());
        assert_eq!(note.tags.len(), 2);
        assert!(note.has_tag("math"));
        assert!(note.has_tag("Math"));
    }

    #[test]
    fn apply_draft_keeps_identity_and_upload_date() {
        let created = Note::from_draft(
            RecordId::from("n-1"),
            NoteDraft::new("Calc", "MATH201"),
            Utc::now(),
        );
        let replaced = created.apply_draft(NoteDraft::new("Calc II", "MATH202"));
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.upload_date, created.upload_date);
        assert_eq!(replaced.title, "Calc II");
        assert!(replaced.tags.is_empty());
    }

    #[test]
    fn wire_shape_uses_camel_case_and_accepts_bare_dates() {
        let json = serde_json::json!({
            "id": "1",
            "title": "Calculus Notes",
            "course": "Mathematics",
            "tags": ["calculus", "math"],
            "uploadDate": "2024-01-14",
            "thumbnailUrl": "ignored.png"
        });
        let note: Note = serde_json::from_value(json).unwrap();
        assert_eq!(note.upload_date.day(), 14);
        assert_eq!(note.content, None);

        let encoded = serde_json::to_value(&note).unwrap();
        assert_eq!(encoded["uploadDate"], "2024-01-14T00:00:00+00:00");
        assert!(encoded.get("fileRef").is_none());
        let decoded: Note = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, note);
    }

    #[test]
    fn seed_notes_are_valid_and_unique() {
        let seed = Note::seed();
        assert_eq!(seed.len(), 5);
        for note in &seed {
            note.validate().unwrap();
        }
        let ids: std::collections::HashSet<_> = seed.iter().map(|note| &note.id).collect();
        assert_eq!(ids.len(), seed.len());
        crate::model::record::check_collection(&seed).unwrap();
    }
}
