//! Weekly timetable entry record.
//!
//! # Responsibility
//! - Define weekday/time/type value types with their wire formats.
//! - Validate timetable drafts, including raw form input.
//!
//! # Invariants
//! - `start_time` is strictly earlier than `end_time`.
//! - `title` is non-empty once accepted.
//! - Canonical order is `(day, start_time, end_time)`.

use crate::model::record::{Record, RecordId, RecordKind, ValidationError};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Weekday, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Parses the exact weekday name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == value.trim())
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timetable entry category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Class,
    Study,
    Exam,
    Assignment,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Study => "study",
            Self::Exam => "exam",
            Self::Assignment => "assignment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "class" => Some(Self::Class),
            "study" => Some(Self::Study),
            "exam" => Some(Self::Exam),
            "assignment" => Some(Self::Assignment),
            _ => None,
        }
    }
}

/// Time of day with minute precision on the wire (`HH:MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parses `HH:MM` or `HH:MM:SS`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .ok()
            .map(Self)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day `{raw}`")))
    }
}

/// One weekly schedule slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: RecordId,
    #[serde(alias = "subject")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    pub day: Day,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    /// Serialized as `type` to match the remote schema.
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Caller input for creating or fully replacing a timetable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableDraft {
    pub title: String,
    pub course: Option<String>,
    pub day: Day,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub kind: EntryType,
    pub location: Option<String>,
}

impl TimetableDraft {
    pub fn new(
        title: impl Into<String>,
        day: Day,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
        kind: EntryType,
    ) -> Self {
        Self {
            title: title.into(),
            course: None,
            day,
            start_time,
            end_time,
            kind,
            location: None,
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl From<&TimetableEntry> for TimetableDraft {
    fn from(entry: &TimetableEntry) -> Self {
        Self {
            title: entry.title.clone(),
            course: entry.course.clone(),
            day: entry.day,
            start_time: entry.start_time,
            end_time: entry.end_time,
            kind: entry.kind,
            location: entry.location.clone(),
        }
    }
}

/// Raw text input from an entry form, before domain parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimetableForm {
    pub title: String,
    pub course: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub kind: String,
    pub location: String,
}

impl TimetableForm {
    /// Parses every field, naming each one that is missing or out of domain.
    pub fn into_draft(self) -> Result<TimetableDraft, ValidationError> {
        let mut err = ValidationError::new();
        err.require_text("title", &self.title);
        let day = Day::parse(&self.day);
        if day.is_none() {
            err.push("day", "must be a weekday name");
        }
        let start_time = TimeOfDay::parse(&self.start_time);
        if start_time.is_none() {
            err.push("startTime", "must be HH:MM");
        }
        let end_time = TimeOfDay::parse(&self.end_time);
        if end_time.is_none() {
            err.push("endTime", "must be HH:MM");
        }
        let kind = EntryType::parse(&self.kind);
        if kind.is_none() {
            err.push("type", "must be class|study|exam|assignment");
        }

        match (day, start_time, end_time, kind) {
            (Some(day), Some(start_time), Some(end_time), Some(kind)) if err.is_empty() => {
                let draft = TimetableDraft {
                    title: self.title,
                    course: non_blank(self.course),
                    day,
                    start_time,
                    end_time,
                    kind,
                    location: non_blank(self.location),
                };
                TimetableEntry::validate_draft(&draft)?;
                Ok(draft)
            }
            _ => Err(err),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn check_window(err: &mut ValidationError, start: TimeOfDay, end: TimeOfDay) {
    if start >= end {
        err.push("endTime", "must be later than startTime");
    }
}

impl Record for TimetableEntry {
    type Draft = TimetableDraft;

    const KIND: RecordKind = RecordKind::Timetable;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &TimetableDraft) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        err.require_text("title", &draft.title);
        check_window(&mut err, draft.start_time, draft.end_time);
        err.into_result()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        err.require_text("id", self.id.as_str());
        err.require_text("title", &self.title);
        check_window(&mut err, self.start_time, self.end_time);
        err.into_result()
    }

    fn from_draft(id: RecordId, draft: TimetableDraft, _now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            course: draft.course.and_then(non_blank),
            day: draft.day,
            start_time: draft.start_time,
            end_time: draft.end_time,
            kind: draft.kind,
            location: draft.location.and_then(non_blank),
        }
    }

    fn apply_draft(&self, draft: TimetableDraft) -> Self {
        Self::from_draft(self.id.clone(), draft, Utc::now())
    }

    fn canonical_cmp(left: &Self, right: &Self) -> Ordering {
        (left.day, left.start_time, left.end_time).cmp(&(
            right.day,
            right.start_time,
            right.end_time,
        ))
    }

    fn seed() -> Vec<Self> {
        [
            (
                "seed-entry-1",
                "Introduction to Algorithms",
                "CS101",
                Day::Monday,
                (9, 0),
                (10, 30),
                EntryType::Class,
            ),
            (
                "seed-entry-2",
                "Calculus Study Session",
                "MATH201",
                Day::Tuesday,
                (14, 0),
                (16, 0),
                EntryType::Study,
            ),
            (
                "seed-entry-3",
                "Physics Lab",
                "PHYS101",
                Day::Wednesday,
                (10, 0),
                (12, 0),
                EntryType::Class,
            ),
        ]
        .into_iter()
        .filter_map(|(id, title, course, day, start, end, kind)| {
            Some(TimetableEntry {
                id: RecordId::from(id),
                title: title.to_string(),
                course: Some(course.to_string()),
                day,
                start_time: TimeOfDay::from_hm(start.0, start.1)?,
                end_time: TimeOfDay::from_hm(end.0, end.1)?,
                kind,
                location: None,
            })
        })
        .collect()
    }
}
