use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::error::PredicateError;
use super::model::Row;
use super::unique::UniqueValueCache;

// ---------------------------------------------------------------------------
// Active filter map: which values are allowed per column
// ---------------------------------------------------------------------------

/// Plain-data shape of the active filters: column key → allowed values.
/// This is what snapshots hand out and what wholesale replacement accepts.
pub type ColumnFilters = BTreeMap<String, Vec<String>>;

/// Versioned store of per-column allow-lists.
///
/// A column that is absent has no restriction. The store never keeps a
/// no-op entry: empty lists are dropped, and so are lists that select every
/// choice of a column whose choice list is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMap {
    entries: ColumnFilters,
    generation: u64,
}

impl FilterMap {
    /// Restrict `key` to `values`. Empty or full-coverage lists remove the
    /// restriction instead. Unknown keys are ignored.
    pub fn set_column(&mut self, key: &str, values: Vec<String>, cache: &UniqueValueCache) {
        if cache.distinct(key).is_none() {
            log::warn!("Ignoring filter for unknown column '{key}'");
            return;
        }
        let values = dedup(values);
        self.generation += 1;

        if values.is_empty() || cache.covers(key, &values) == Some(true) {
            log::debug!("Column '{key}' filter covers everything, removing");
            self.entries.remove(key);
        } else {
            log::debug!("Column '{key}' restricted to {} values", values.len());
            self.entries.insert(key.to_string(), values);
        }
    }

    /// Remove the restriction on `key`, if any.
    pub fn clear_column(&mut self, key: &str) {
        self.generation += 1;
        if self.entries.remove(key).is_none() {
            log::debug!("Column '{key}' had no filter to clear");
        }
    }

    /// Drop every restriction.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.entries.clear();
    }

    /// Replace the whole map. Empty lists and unknown columns are dropped.
    /// Full coverage can only be detected for columns whose choice list is
    /// already populated; other entries are kept verbatim.
    pub fn replace(&mut self, filters: ColumnFilters, cache: &UniqueValueCache) {
        self.generation += 1;
        self.entries = filters
            .into_iter()
            .filter_map(|(key, values)| {
                if cache.distinct(&key).is_none() {
                    log::warn!("Ignoring filter for unknown column '{key}'");
                    return None;
                }
                let values = dedup(values);
                if values.is_empty() || cache.covers_populated(&key, &values) == Some(true) {
                    return None;
                }
                Some((key, values))
            })
            .collect();
    }

    /// Deep, independent copy of the current allow-lists.
    pub fn snapshot(&self) -> ColumnFilters {
        self.entries.clone()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of restricted columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Pre-filter: an externally supplied row gate
// ---------------------------------------------------------------------------

type PredicateFn = dyn Fn(&Row) -> Result<bool, PredicateError> + Send + Sync;

/// A gate owned by the embedding application, applied before the column
/// filters. Cheap to clone.
#[derive(Clone)]
pub struct PreFilter {
    label: String,
    predicate: Arc<PredicateFn>,
}

impl PreFilter {
    /// Wrap an infallible predicate.
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        Self::fallible(label, move |row: &Row| Ok(predicate(row)))
    }

    /// Wrap a predicate that may fail. A failure aborts the recompute it
    /// happens in and is reported to the caller.
    pub fn fallible<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Row) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        PreFilter {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn test(&self, row: &Row) -> Result<bool, PredicateError> {
        (self.predicate)(row)
    }
}

impl fmt::Debug for PreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreFilter")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ColumnKeys, RawRecord, RawValue};
    use crate::data::normalize::normalize;

    fn cache() -> UniqueValueCache {
        let records: Vec<RawRecord> = [("Placed", "CS"), ("Open", "CS"), ("Placed", "EE")]
            .iter()
            .map(|(status, course)| {
                let mut rec = RawRecord::new();
                rec.insert("status".into(), RawValue::from(*status));
                rec.insert("course".into(), RawValue::from(*course));
                rec
            })
            .collect();
        UniqueValueCache::build(&normalize(&records, ColumnKeys::new(["status", "course"])))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn partial_selection_is_recorded() {
        let cache = cache();
        let mut map = FilterMap::default();
        map.set_column("status", strings(&["Placed", "Placed"]), &cache);
        assert_eq!(map.get("status"), Some(&["Placed".to_string()][..]));
        assert_eq!(map.generation(), 1);
    }

    #[test]
    fn empty_or_full_selection_removes_restriction() {
        let cache = cache();
        let mut map = FilterMap::default();
        map.set_column("status", strings(&["Open"]), &cache);
        map.set_column("status", strings(&["Open", "Placed"]), &cache);
        assert!(map.is_empty());

        map.set_column("course", strings(&["EE"]), &cache);
        map.set_column("course", Vec::new(), &cache);
        assert!(map.is_empty());
    }

    #[test]
    fn unknown_column_is_ignored() {
        let cache = cache();
        let mut map = FilterMap::default();
        map.set_column("gender", strings(&["F"]), &cache);
        assert!(map.is_empty());
        assert_eq!(map.generation(), 0);
    }

    #[test]
    fn replace_keeps_unpopulated_full_coverage_verbatim() {
        let cache = cache();
        let mut map = FilterMap::default();
        let mut wanted = ColumnFilters::new();
        wanted.insert("status".into(), strings(&["Placed", "Open"]));
        wanted.insert("course".into(), Vec::new());
        wanted.insert("gender".into(), strings(&["F"]));

        map.replace(wanted.clone(), &cache);
        assert_eq!(map.len(), 1);
        assert!(map.get("status").is_some());

        // Once the choice list is known, coverage is detected.
        cache.choices("status");
        map.replace(wanted, &cache);
        assert!(map.is_empty());
    }

    #[test]
    fn snapshot_is_independent() {
        let cache = cache();
        let mut map = FilterMap::default();
        map.set_column("course", strings(&["EE"]), &cache);

        let mut snap = map.snapshot();
        snap.get_mut("course").unwrap().push("CS".into());
        snap.insert("status".into(), strings(&["Open"]));

        assert_eq!(map.get("course"), Some(&["EE".to_string()][..]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn pre_filter_reports_failures() {
        let gate = PreFilter::fallible("broken", |_row: &Row| Err("boom".into()));
        let err = gate.test(&Row::default()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(gate.label(), "broken");
    }
}
