/// Data layer: loading, normalization and the facet filter engine.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawDataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  every cell → trimmed string → Dataset
///   └───────────┘
///        │
///        ├──────────────► unique   distinct values, lazy choice lists
///        ▼
///   ┌──────────┐
///   │  facets   │  FilterMap + PreFilter ─► engine ─► VisibleRows
///   └──────────┘
/// ```

pub mod engine;
pub mod error;
pub mod facets;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod unique;
