//! Filter criteria chosen in list views.

use std::collections::BTreeSet;

/// Multi-criteria filter for one collection view.
///
/// Empty fields impose no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterCriteria {
    /// Case-insensitive substring over title, course and tags.
    pub search_text: String,
    /// Exact facet value: course for notes, day name for timetable entries.
    pub facet: String,
    /// Selected tags; a record matches if it carries any of them.
    pub tags: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = facet.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Adds `tag` to the selection, or removes it if already selected.
    ///
    /// Returns whether the tag is selected afterwards.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }

    /// Search text with surrounding whitespace removed, or `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        let trimmed = self.search_text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn facet_value(&self) -> Option<&str> {
        (!self.facet.is_empty()).then_some(self.facet.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.facet_value().is_none() && self.tags.is_empty()
    }
}
