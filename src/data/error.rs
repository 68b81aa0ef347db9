use thiserror::Error;

/// Error type a pre-filter predicate may fail with.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FilterError {
    /// The embedding application's pre-filter failed while being evaluated.
    /// The mutation that triggered the recompute was not committed.
    #[error("pre-filter failed on row {row}")]
    PreFilter {
        row: usize,
        #[source]
        source: PredicateError,
    },
}

pub type Result<T> = std::result::Result<T, FilterError>;
