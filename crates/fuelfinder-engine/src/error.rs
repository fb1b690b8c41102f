use thiserror::Error;

/// Precondition failures reported by the query operations.
///
/// Empty results are never errors; they come back as empty sequences.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("at least one category must be selected")]
    EmptyCategoryFilter,
}
