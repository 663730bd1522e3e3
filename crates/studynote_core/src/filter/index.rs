//! Memoized filter views and filter choices over store snapshots.

use crate::filter::{apply, distinct_facets, distinct_tags, FilterCriteria, Filterable};
use crate::store::Snapshot;
use std::sync::{Arc, Mutex, PoisonError};

/// Facet and tag options offered by filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChoices {
    pub facets: Vec<String>,
    pub tags: Vec<String>,
}

struct Memo<T, K, V> {
    /// Collection the value was computed from.
    source: Arc<Vec<T>>,
    key: K,
    value: Arc<V>,
}

impl<T, K: PartialEq, V> Memo<T, K, V> {
    fn hit(&self, records: &Arc<Vec<T>>, key: &K) -> Option<Arc<V>> {
        (Arc::ptr_eq(&self.source, records) && &self.key == key).then(|| Arc::clone(&self.value))
    }
}

/// Filter view cache.
///
/// Remembers the last view per collection and criteria and the last choices
/// per collection. A collection is identified by its snapshot's record
/// allocation, so snapshots from different stores never share entries.
/// Results are identical to calling `apply` directly.
pub struct FilterIndex<T> {
    view: Mutex<Option<Memo<T, FilterCriteria, Vec<T>>>>,
    choices: Mutex<Option<Memo<T, (), FilterChoices>>>,
}

impl<T: Filterable + Clone> FilterIndex<T> {
    pub fn new() -> Self {
        Self {
            view: Mutex::new(None),
            choices: Mutex::new(None),
        }
    }

    pub fn view(&self, snapshot: &Snapshot<T>, criteria: &FilterCriteria) -> Arc<Vec<T>> {
        let mut memo = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = memo.as_ref().and_then(|m| m.hit(&snapshot.records, criteria)) {
            return hit;
        }

        let value = if criteria.is_empty() {
            Arc::clone(&snapshot.records)
        } else {
            Arc::new(apply(&snapshot.records, criteria))
        };
        *memo = Some(Memo {
            source: Arc::clone(&snapshot.records),
            key: criteria.clone(),
            value: Arc::clone(&value),
        });
        value
    }

    pub fn choices(&self, snapshot: &Snapshot<T>) -> Arc<FilterChoices> {
        let mut memo = self.choices.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = memo.as_ref().and_then(|m| m.hit(&snapshot.records, &())) {
            return hit;
        }

        let value = Arc::new(FilterChoices {
            facets: distinct_facets(&snapshot.records),
            tags: distinct_tags(&snapshot.records),
        });
        *memo = Some(Memo {
            source: Arc::clone(&snapshot.records),
            key: (),
            value: Arc::clone(&value),
        });
        value
    }
}

impl<T: Filterable + Clone> Default for FilterIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
