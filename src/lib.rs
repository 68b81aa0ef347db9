//! Excel-style column facet filters over an in-memory table.
//!
//! Load a file with [`data::loader::load_file`], wrap it in a
//! [`FacetTable`] and drive it through its set/clear/replace operations;
//! every mutation recomputes the visible rows.

pub mod data;

pub use data::engine::{Selection, VisibleRows};
pub use data::error::{FilterError, PredicateError};
pub use data::facets::{FacetTable, RowSink};
pub use data::filter::{ColumnFilters, FilterMap, PreFilter};
pub use data::model::{ColumnKeys, Dataset, RawDataset, RawRecord, RawValue, Row};
