use super::engine::{Selection, VisibleRows, compute_selection};
use super::error::Result;
use super::filter::{ColumnFilters, FilterMap, PreFilter};
use super::model::{ColumnKeys, Dataset, RawDataset, RawRecord, Row};
use super::normalize::normalize;
use super::unique::UniqueValueCache;

// ---------------------------------------------------------------------------
// Rendering hook
// ---------------------------------------------------------------------------

/// Receives the new visible rows after every successful recompute. The
/// receiver should replace what it shows without resetting its paging.
pub trait RowSink {
    fn replace_rows(&mut self, rows: VisibleRows<'_>);
}

// ---------------------------------------------------------------------------
// FacetTable – the control surface
// ---------------------------------------------------------------------------

/// A normalized dataset with per-column facet filters.
///
/// Every mutating call commits the new state and its recomputed rows in one
/// step: if the recompute fails (only a pre-filter can fail) nothing
/// changes. Read accessors never recompute.
pub struct FacetTable {
    dataset: Dataset,
    cache: UniqueValueCache,
    filters: FilterMap,
    pre_filter: Option<PreFilter>,
    selection: Selection,
    sink: Option<Box<dyn RowSink>>,
}

impl FacetTable {
    /// Normalize `records` over `columns`, cache the distinct values and
    /// compute the initial rows.
    pub fn new(
        records: &[RawRecord],
        columns: ColumnKeys,
        pre_filter: Option<PreFilter>,
    ) -> Result<Self> {
        Self::from_dataset(normalize(records, columns), pre_filter)
    }

    /// Build from a loader result, keeping the file's column order.
    pub fn from_raw(raw: &RawDataset) -> Result<Self> {
        Self::new(&raw.records, ColumnKeys::new(raw.columns.iter().cloned()), None)
    }

    pub fn from_dataset(dataset: Dataset, pre_filter: Option<PreFilter>) -> Result<Self> {
        let cache = UniqueValueCache::build(&dataset);
        let filters = FilterMap::default();
        let selection = compute_selection(&dataset, &filters, pre_filter.as_ref())?;
        log::info!(
            "Facet table ready: {} rows, {} columns",
            dataset.len(),
            dataset.columns().len()
        );
        Ok(FacetTable {
            dataset,
            cache,
            filters,
            pre_filter,
            selection,
            sink: None,
        })
    }

    /// Attach the rendering hook. It is called immediately with the current
    /// rows, then after every recompute.
    pub fn set_sink(&mut self, sink: impl RowSink + 'static) {
        let mut sink: Box<dyn RowSink> = Box::new(sink);
        sink.replace_rows(VisibleRows::new(&self.dataset, &self.selection));
        self.sink = Some(sink);
    }

    // -- Mutations ----------------------------------------------------------

    /// Restrict `key` to `values`. Empty or full-coverage lists clear the
    /// column instead; unknown keys change nothing.
    pub fn set_column_filter<I, S>(&mut self, key: &str, values: I) -> Result<VisibleRows<'_>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.filters.clone();
        next.set_column(key, values.into_iter().map(Into::into).collect(), &self.cache);
        self.commit(next, self.pre_filter.clone())
    }

    /// Remove the restriction on `key`.
    pub fn clear_column(&mut self, key: &str) -> Result<VisibleRows<'_>> {
        let mut next = self.filters.clone();
        next.clear_column(key);
        self.commit(next, self.pre_filter.clone())
    }

    /// Remove every column restriction. The pre-filter stays.
    pub fn clear_all(&mut self) -> Result<VisibleRows<'_>> {
        let mut next = self.filters.clone();
        next.clear();
        self.commit(next, self.pre_filter.clone())
    }

    /// Replace all column restrictions at once.
    pub fn replace_all(&mut self, filters: ColumnFilters) -> Result<VisibleRows<'_>> {
        let mut next = self.filters.clone();
        next.replace(filters, &self.cache);
        self.commit(next, self.pre_filter.clone())
    }

    /// Install or remove the external pre-filter.
    pub fn set_pre_filter(&mut self, pre_filter: Option<PreFilter>) -> Result<VisibleRows<'_>> {
        self.commit(self.filters.clone(), pre_filter)
    }

    fn commit(
        &mut self,
        filters: FilterMap,
        pre_filter: Option<PreFilter>,
    ) -> Result<VisibleRows<'_>> {
        let selection = compute_selection(&self.dataset, &filters, pre_filter.as_ref())?;
        self.filters = filters;
        self.pre_filter = pre_filter;
        self.selection = selection;

        if let Some(sink) = self.sink.as_mut() {
            sink.replace_rows(VisibleRows::new(&self.dataset, &self.selection));
        }
        Ok(self.visible_rows())
    }

    // -- Reads --------------------------------------------------------------

    /// Rows passing the pre-filter and every column filter.
    pub fn visible_rows(&self) -> VisibleRows<'_> {
        VisibleRows::new(&self.dataset, &self.selection)
    }

    /// Owned copy of the visible rows.
    pub fn current_rows(&self) -> Vec<Row> {
        self.visible_rows().to_vec()
    }

    /// Deep copy of the active column filters.
    pub fn snapshot(&self) -> ColumnFilters {
        self.filters.snapshot()
    }

    pub fn pre_filter(&self) -> Option<&PreFilter> {
        self.pre_filter.as_ref()
    }

    /// The full normalized dataset.
    pub fn raw_data(&self) -> &Dataset {
        &self.dataset
    }

    pub fn columns(&self) -> &ColumnKeys {
        self.dataset.columns()
    }

    /// Choice list of `key`, populated on first request.
    pub fn choices(&self, key: &str) -> Option<&[String]> {
        self.cache.choices(key)
    }

    pub fn is_populated(&self, key: &str) -> bool {
        self.cache.is_populated(key)
    }

    pub fn column_filter(&self, key: &str) -> Option<&[String]> {
        self.filters.get(key)
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.filters.get(key).is_some()
    }

    /// Number of restricted columns.
    pub fn active_count(&self) -> usize {
        self.filters.len()
    }

    /// Version of the committed filter state.
    pub fn generation(&self) -> u64 {
        self.filters.generation()
    }
}

impl std::fmt::Debug for FacetTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetTable")
            .field("rows", &self.dataset.len())
            .field("columns", self.dataset.columns())
            .field("filters", &self.filters)
            .field("pre_filter", &self.pre_filter)
            .field("visible", &self.visible_rows().len())
            .finish_non_exhaustive()
    }
}
