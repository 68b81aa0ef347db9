use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use facet_grid::data::model::{ColumnKeys, RawDataset, Row};
use facet_grid::{FacetTable, FilterError, PreFilter, RowSink, VisibleRows};

use crate::config::ViewerConfig;

/// Label shown for the blank value in choice lists.
pub const BLANK_LABEL: &str = "(Blank)";

// ---------------------------------------------------------------------------
// Column panel: the draft selection behind one column's filter button
// ---------------------------------------------------------------------------

/// Commands a column panel can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Search(String),
    Toggle(usize),
    SelectAllVisible,
    DeselectAllVisible,
    Apply,
    ClearColumn,
}

/// Checkbox state for one column. Built from the column's choice list the
/// first time the panel is opened; nothing reaches the table until Apply.
#[derive(Debug, Clone, Default)]
pub struct ColumnPanel {
    pub choices: Vec<String>,
    pub checked: Vec<bool>,
    pub search: String,
}

impl ColumnPanel {
    pub fn new(choices: &[String], active: Option<&[String]>) -> Self {
        let mut panel = ColumnPanel {
            choices: choices.to_vec(),
            checked: vec![true; choices.len()],
            search: String::new(),
        };
        panel.sync(active);
        panel
    }

    /// Re-check boxes from the committed filter: only the allowed values,
    /// or everything when the column is unrestricted.
    pub fn sync(&mut self, active: Option<&[String]>) {
        for (value, checked) in self.choices.iter().zip(self.checked.iter_mut()) {
            *checked = active.is_none_or(|allowed| allowed.contains(value));
        }
    }

    pub fn label(value: &str) -> &str {
        if value.is_empty() { BLANK_LABEL } else { value }
    }

    /// Indices of choices whose label matches the search box.
    pub fn visible(&self) -> Vec<usize> {
        let term = self.search.trim().to_lowercase();
        self.choices
            .iter()
            .enumerate()
            .filter(|(_, v)| term.is_empty() || Self::label(v).to_lowercase().contains(&term))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn set_visible(&mut self, checked: bool) {
        for i in self.visible() {
            self.checked[i] = checked;
        }
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(c) = self.checked.get_mut(index) {
            *c = !*c;
        }
    }

    pub fn selected(&self) -> Vec<String> {
        self.choices
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// (checked, total)
    pub fn counts(&self) -> (usize, usize) {
        (
            self.checked.iter().filter(|c| **c).count(),
            self.choices.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Pager: page position that survives row replacement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Pager {
            page: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Keep the current page after the rows were replaced, pulling back to
    /// the last page if the row count shrank below it.
    pub fn replace_rows(&mut self, total: usize) {
        self.page = self.page.min(self.page_count(total) - 1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let first = self.page * self.page_size;
        self.page_size = page_size.max(1);
        self.page = first / self.page_size;
    }

    /// Row positions shown on the current page.
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let start = (self.page * self.page_size).min(total);
        start..(start + self.page_size).min(total)
    }
}

/// Table render hook that keeps a shared pager in line with the rows.
pub struct PagerSink(pub Rc<RefCell<Pager>>);

impl RowSink for PagerSink {
    fn replace_rows(&mut self, rows: VisibleRows<'_>) {
        self.0.borrow_mut().replace_rows(rows.len());
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Loaded table (None until user loads a file).
    pub table: Option<FacetTable>,

    /// Panels built so far, by column key.
    pub panels: BTreeMap<String, ColumnPanel>,

    /// Column whose panel is open.
    pub open_panel: Option<String>,

    /// Text of the quick filter box.
    pub quick_filter: String,

    /// Shared with the table's [`PagerSink`].
    pub pager: Rc<RefCell<Pager>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            pager: Rc::new(RefCell::new(Pager::new(config.page_size))),
            config,
            table: None,
            panels: BTreeMap::new(),
            open_panel: None,
            quick_filter: String::new(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and reset all filter UI.
    pub fn set_dataset(&mut self, raw: RawDataset) {
        let columns = match &self.config.columns {
            Some(keys) => ColumnKeys::new(keys.iter().cloned()),
            None => ColumnKeys::new(raw.columns.iter().cloned()),
        };
        *self.pager.borrow_mut() = Pager::new(self.config.page_size);
        match FacetTable::new(&raw.records, columns, None) {
            Ok(mut table) => {
                table.set_sink(PagerSink(Rc::clone(&self.pager)));
                self.table = Some(table);
                self.status_message = None;
            }
            Err(e) => self.report(e),
        }
        self.panels.clear();
        self.open_panel = None;
        self.quick_filter.clear();
    }

    /// Number of rows currently visible.
    pub fn visible_len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.visible_rows().len())
    }

    /// Open `column`'s panel (building it on first open) or close it if it
    /// is already open.
    pub fn toggle_panel(&mut self, column: &str) {
        if self.open_panel.as_deref() == Some(column) {
            self.open_panel = None;
            return;
        }
        let Some(table) = &self.table else {
            return;
        };
        if !self.panels.contains_key(column) {
            let Some(choices) = table.choices(column) else {
                return;
            };
            let panel = ColumnPanel::new(choices, table.column_filter(column));
            self.panels.insert(column.to_string(), panel);
        }
        if let Some(panel) = self.panels.get_mut(column) {
            panel.search.clear();
        }
        self.open_panel = Some(column.to_string());
    }

    pub fn panel_action(&mut self, column: &str, action: PanelAction) {
        let Some(panel) = self.panels.get_mut(column) else {
            return;
        };
        match action {
            PanelAction::Search(text) => panel.search = text,
            PanelAction::Toggle(i) => panel.toggle(i),
            PanelAction::SelectAllVisible => panel.set_visible(true),
            PanelAction::DeselectAllVisible => panel.set_visible(false),
            PanelAction::Apply => {
                let selected = panel.selected();
                let result = self
                    .table
                    .as_mut()
                    .map(|t| t.set_column_filter(column, selected).map(|_| ()));
                self.after_mutation(result);
                self.open_panel = None;
            }
            PanelAction::ClearColumn => {
                let result = self
                    .table
                    .as_mut()
                    .map(|t| t.clear_column(column).map(|_| ()));
                self.after_mutation(result);
            }
        }
    }

    /// Drop every column filter; the quick filter stays.
    pub fn clear_all_filters(&mut self) {
        let result = self
            .table
            .as_mut()
            .map(|t| t.clear_all().map(|_| ()));
        self.after_mutation(result);
    }

    /// Install the quick filter as the table's pre-filter: a row passes when
    /// any cell contains the text, ignoring case.
    pub fn set_quick_filter(&mut self, text: &str) {
        self.quick_filter = text.to_string();
        let needle = text.trim().to_lowercase();
        let gate = (!needle.is_empty()).then(|| {
            PreFilter::new(format!("quick filter '{needle}'"), move |row: &Row| {
                row.iter().any(|(_, v)| v.to_lowercase().contains(&needle))
            })
        });
        let result = self
            .table
            .as_mut()
            .map(|t| t.set_pre_filter(gate).map(|_| ()));
        self.after_mutation(result);
    }

    /// Keep the built panels in line with the committed table state. The
    /// pager follows through its sink.
    fn after_mutation(&mut self, result: Option<Result<(), FilterError>>) {
        match result {
            Some(Ok(())) => self.sync_panels(),
            Some(Err(e)) => self.report(e),
            None => {}
        }
    }

    fn sync_panels(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        for (column, panel) in &mut self.panels {
            panel.sync(table.column_filter(column));
        }
    }

    fn report(&mut self, e: FilterError) {
        log::error!("Filter update failed: {e}");
        self.status_message = Some(format!("Error: {e}"));
    }
}
