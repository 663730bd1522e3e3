//! Derived, side-effect-free views over canonical collections.
//!
//! # Responsibility
//! - Apply search/facet/tag criteria to a collection snapshot.
//! - Derive facet and tag choices for filter controls.
//!
//! # Invariants
//! - Active predicates combine with AND; selected tags combine with OR.
//! - Views preserve canonical collection order.
//! - Nothing here mutates or persists a collection.

use crate::model::note::Note;
use crate::model::timetable::{Day, TimetableEntry};
use std::cmp::Reverse;
use std::collections::HashSet;

mod criteria;
mod index;

pub use criteria::FilterCriteria;
pub use index::{FilterChoices, FilterIndex};

/// Number of notes returned by `recent` when the limit is 0.
pub const DEFAULT_RECENT_LIMIT: usize = 3;

/// Fields a record exposes to the filter.
pub trait Filterable {
    fn title(&self) -> &str;

    fn course(&self) -> Option<&str>;

    /// Exact-match facet value.
    fn facet(&self) -> &str;

    fn tags(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|own| own == tag)
    }
}

impl Filterable for Note {
    fn title(&self) -> &str {
        &self.title
    }

    fn course(&self) -> Option<&str> {
        Some(&self.course)
    }

    fn facet(&self) -> &str {
        &self.course
    }

    fn tags(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.tags.iter().map(String::as_str))
    }

    fn has_tag(&self, tag: &str) -> bool {
        Note::has_tag(self, tag)
    }
}

impl Filterable for TimetableEntry {
    fn title(&self) -> &str {
        &self.title
    }

    fn course(&self) -> Option<&str> {
        self.course.as_deref()
    }

    fn facet(&self) -> &str {
        self.day.as_str()
    }

    fn tags(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(std::iter::empty())
    }
}

/// Returns whether `record` passes every active predicate of `criteria`.
pub fn matches<T: Filterable>(record: &T, criteria: &FilterCriteria) -> bool {
    if let Some(term) = criteria.search_term() {
        let needle = term.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        let hit = contains(record.title())
            || record.course().is_some_and(contains)
            || record.tags().any(contains);
        if !hit {
            return false;
        }
    }

    if let Some(facet) = criteria.facet_value() {
        if record.facet() != facet {
            return false;
        }
    }

    if !criteria.tags.is_empty() && !criteria.tags.iter().any(|tag| record.has_tag(tag)) {
        return false;
    }

    true
}

/// Filters `records` by `criteria`, keeping their order.
pub fn apply<T: Filterable + Clone>(records: &[T], criteria: &FilterCriteria) -> Vec<T> {
    if criteria.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| matches(*record, criteria))
        .cloned()
        .collect()
}

/// Distinct facet values in order of first appearance.
pub fn distinct_facets<T: Filterable>(records: &[T]) -> Vec<String> {
    first_appearance(records.iter().map(|record| record.facet()))
}

/// Distinct tags in order of first appearance.
pub fn distinct_tags<T: Filterable>(records: &[T]) -> Vec<String> {
    first_appearance(records.iter().flat_map(|record| record.tags()))
}

/// Newest notes first by upload date; ties keep collection order.
///
/// A `limit` of 0 means `DEFAULT_RECENT_LIMIT`.
pub fn recent(notes: &[Note], limit: usize) -> Vec<Note> {
    let limit = if limit == 0 { DEFAULT_RECENT_LIMIT } else { limit };
    let mut sorted: Vec<&Note> = notes.iter().collect();
    sorted.sort_by_key(|note| Reverse(note.upload_date));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Timetable entries on `day`, ordered by start time.
pub fn entries_for_day(entries: &[TimetableEntry], day: Day) -> Vec<TimetableEntry> {
    apply(entries, &FilterCriteria::new().with_facet(day.as_str()))
}

fn first_appearance<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
