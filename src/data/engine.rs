use std::collections::HashSet;
use std::time::Instant;

use super::error::{FilterError, Result};
use super::filter::{FilterMap, PreFilter};
use super::model::{Dataset, Row};

// ---------------------------------------------------------------------------
// Selection: which dataset rows are visible
// ---------------------------------------------------------------------------

/// Result of a recompute, expressed against the dataset it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every row, in dataset order. No copy of the dataset is made.
    #[default]
    All,
    /// Indices of passing rows, ascending.
    Indices(Vec<usize>),
}

/// Borrowed view of the visible rows, in dataset order.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRows<'a> {
    dataset: &'a Dataset,
    selection: &'a Selection,
}

impl<'a> VisibleRows<'a> {
    pub fn new(dataset: &'a Dataset, selection: &'a Selection) -> Self {
        VisibleRows { dataset, selection }
    }

    pub fn len(&self) -> usize {
        match self.selection {
            Selection::All => self.dataset.len(),
            Selection::Indices(ix) => ix.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is the whole dataset (no gate, no column filter).
    pub fn is_all(&self) -> bool {
        matches!(self.selection, Selection::All)
    }

    /// The `n`-th visible row.
    pub fn get(&self, n: usize) -> Option<&'a Row> {
        match self.selection {
            Selection::All => self.dataset.row(n),
            Selection::Indices(ix) => ix.get(n).and_then(|&i| self.dataset.row(i)),
        }
    }

    /// Dataset index of each visible row.
    pub fn indices(&self) -> Box<dyn Iterator<Item = usize> + 'a> {
        match self.selection {
            Selection::All => Box::new(0..self.dataset.len()),
            Selection::Indices(ix) => Box::new(ix.iter().copied()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Row> + 'a {
        let dataset = self.dataset;
        self.indices().filter_map(move |i| dataset.row(i))
    }

    /// Owned copy of the visible rows.
    pub fn to_vec(&self) -> Vec<Row> {
        self.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Compiled column predicates
// ---------------------------------------------------------------------------

/// One active column filter compiled to a hash set for O(1) membership.
#[derive(Debug)]
pub struct CompiledFilter<'a> {
    pub key: &'a str,
    pub allowed: HashSet<&'a str>,
}

impl CompiledFilter<'_> {
    pub fn matches(&self, row: &Row) -> bool {
        self.allowed.contains(row.value(self.key))
    }
}

/// Compile each non-empty allow-list once per recompute.
pub fn compile(filters: &FilterMap) -> Vec<CompiledFilter<'_>> {
    filters
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, values)| CompiledFilter {
            key,
            allowed: values.iter().map(String::as_str).collect(),
        })
        .collect()
}

/// A row passes when every compiled filter accepts it. Stops at the first
/// rejecting column.
pub fn row_passes(row: &Row, compiled: &[CompiledFilter<'_>]) -> bool {
    compiled.iter().all(|c| c.matches(row))
}

// ---------------------------------------------------------------------------
// Recompute
// ---------------------------------------------------------------------------

/// Compute the visible rows for the given state.
///
/// 1. Base set: rows accepted by `pre_filter`, or the whole dataset.
/// 2. No active column filters → the base set as is.
/// 3. Otherwise compile the allow-lists and keep, in a single pass, the base
///    rows that every compiled filter accepts.
///
/// A failing pre-filter aborts the computation.
pub fn compute_selection(
    dataset: &Dataset,
    filters: &FilterMap,
    pre_filter: Option<&PreFilter>,
) -> Result<Selection> {
    let started = Instant::now();
    let base = match pre_filter {
        Some(gate) => Some(gate_rows(dataset, gate)?),
        None => None,
    };

    if filters.is_empty() {
        return Ok(base.map_or(Selection::All, Selection::Indices));
    }

    let compiled = compile(filters);
    if compiled.is_empty() {
        return Ok(base.map_or(Selection::All, Selection::Indices));
    }

    let rows = dataset.rows();
    let indices: Vec<usize> = match base {
        Some(base) => base
            .into_iter()
            .filter(|&i| row_passes(&rows[i], &compiled))
            .collect(),
        None => rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row_passes(row, &compiled))
            .map(|(i, _)| i)
            .collect(),
    };

    log::debug!(
        "Filtered {} → {} rows with {} column filters in {:?}",
        dataset.len(),
        indices.len(),
        compiled.len(),
        started.elapsed()
    );
    Ok(Selection::Indices(indices))
}

fn gate_rows(dataset: &Dataset, gate: &PreFilter) -> Result<Vec<usize>> {
    let mut passing = Vec::new();
    for (row, record) in dataset.rows().iter().enumerate() {
        let keep = gate
            .test(record)
            .map_err(|source| FilterError::PreFilter { row, source })?;
        if keep {
            passing.push(row);
        }
    }
    log::debug!(
        "Pre-filter '{}' kept {} of {} rows",
        gate.label(),
        passing.len(),
        dataset.len()
    );
    Ok(passing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::ColumnFilters;
    use crate::data::model::{ColumnKeys, RawRecord, RawValue};
    use crate::data::normalize::normalize;
    use crate::data::unique::UniqueValueCache;

    fn placements() -> Dataset {
        let records: Vec<RawRecord> = [("Placed", "CS"), ("Open", "CS"), ("Placed", "EE")]
            .iter()
            .map(|(status, course)| {
                let mut rec = RawRecord::new();
                rec.insert("status".into(), RawValue::from(*status));
                rec.insert("course".into(), RawValue::from(*course));
                rec
            })
            .collect();
        normalize(&records, ColumnKeys::new(["status", "course"]))
    }

    fn filters(ds: &Dataset, entries: &[(&str, &[&str])]) -> FilterMap {
        let cache = UniqueValueCache::build(ds);
        let wanted: ColumnFilters = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        let mut map = FilterMap::default();
        map.replace(wanted, &cache);
        map
    }

    #[test]
    fn no_filters_short_circuits_to_all() {
        let ds = placements();
        let sel = compute_selection(&ds, &FilterMap::default(), None).unwrap();
        assert_eq!(sel, Selection::All);
        assert_eq!(VisibleRows::new(&ds, &sel).len(), 3);
    }

    #[test]
    fn single_column_keeps_matching_rows_in_order() {
        let ds = placements();
        let map = filters(&ds, &[("status", &["Placed"])]);
        let sel = compute_selection(&ds, &map, None).unwrap();
        assert_eq!(sel, Selection::Indices(vec![0, 2]));
    }

    #[test]
    fn columns_combine_with_and() {
        let ds = placements();
        let map = filters(&ds, &[("status", &["Placed"]), ("course", &["EE"])]);
        let sel = compute_selection(&ds, &map, None).unwrap();
        assert_eq!(sel, Selection::Indices(vec![2]));
    }

    #[test]
    fn absent_values_match_nothing() {
        let ds = placements();
        let map = filters(&ds, &[("course", &["ME"])]);
        let sel = compute_selection(&ds, &map, None).unwrap();
        assert!(VisibleRows::new(&ds, &sel).is_empty());
    }

    #[test]
    fn pre_filter_runs_before_column_filters() {
        let ds = placements();
        let gate = PreFilter::new("cs only", |row: &Row| row.value("course") == "CS");
        let map = filters(&ds, &[("status", &["Placed"])]);

        let sel = compute_selection(&ds, &FilterMap::default(), Some(&gate)).unwrap();
        assert_eq!(sel, Selection::Indices(vec![0, 1]));

        let sel = compute_selection(&ds, &map, Some(&gate)).unwrap();
        let rows = VisibleRows::new(&ds, &sel);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get(0).unwrap().value("status"), "Placed");
        assert_eq!(rows.get(0).unwrap().value("course"), "CS");
    }

    #[test]
    fn failing_pre_filter_is_propagated() {
        let ds = placements();
        let gate = PreFilter::fallible("flaky", |row: &Row| {
            if row.value("course") == "EE" {
                Err("cannot judge EE".into())
            } else {
                Ok(true)
            }
        });
        let err = compute_selection(&ds, &FilterMap::default(), Some(&gate)).unwrap_err();
        match err {
            FilterError::PreFilter { row, .. } => assert_eq!(row, 2),
        }
    }

    #[test]
    fn compile_builds_one_set_per_column() {
        let ds = placements();
        let map = filters(&ds, &[("status", &["Placed", "Placed"]), ("course", &["CS"])]);
        let compiled = compile(&map);
        assert_eq!(compiled.len(), 2);
        assert!(compiled.iter().all(|c| c.allowed.len() == 1));
    }
}
