//! Error types for data operations.

use cashcycle_panel::PanelError;
use std::fmt;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// One row-level schema problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Table the row belongs to
    pub table: String,
    /// Zero-based row position
    pub row: usize,
    /// Offending column
    pub column: String,
    /// What is wrong with the value
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {}: {} {}",
            self.table, self.row, self.column, self.message
        )
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while loading, validating or generating data.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File lacks required header columns
    #[error("{path} is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// File that was read
        path: String,
        /// Names of the absent columns
        columns: Vec<String>,
    },

    /// A numeric cell could not be parsed
    #[error("{path} line {line}: cannot parse {value:?} in column '{column}' as a number")]
    Parse {
        /// File that was read
        path: String,
        /// One-based line number, header included
        line: u64,
        /// Column of the cell
        column: String,
        /// Raw cell text
        value: String,
    },

    /// Schema validation found problems
    #[error("Validation failed with {} problem(s): {}", .0.len(), join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// Percentile outside `[0, 1]`
    #[error("Invalid percentile: {0} (expected 0..=1)")]
    InvalidPercentile(f64),

    /// Panel engine error
    #[error(transparent)]
    Panel(#[from] PanelError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
