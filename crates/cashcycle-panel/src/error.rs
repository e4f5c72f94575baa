//! Error types for panel construction.

use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that abort a panel build.
///
/// None of these are transient: every variant describes a problem with the
/// inputs or the configuration, so a run fails fast instead of retrying.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Quarter label does not match `YYYYQ[1-4]`
    #[error("Malformed period label: {0:?} (expected YYYYQ1..YYYYQ4)")]
    MalformedPeriod(String),

    /// A table lacks columns the operation reads
    #[error("Table '{table}' is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Which table was checked
        table: String,
        /// Names of the absent columns
        columns: Vec<String>,
    },

    /// Rule or spec needs an industry code but none is present
    #[error("{operation} requires a populated 'industry' column")]
    MissingIndustry {
        /// Rule or spec that needed the column
        operation: String,
    },

    /// `custom_dates` selected without an event table
    #[error("custom_dates requires a custom events table with columns firm_id,event_quarter")]
    MissingCustomEvents,

    /// `industry_wave` selected without a wave table
    #[error("industry_wave requires an industry wave table with columns industry,quarter,wave")]
    MissingWaveTable,

    /// Unrecognized treatment rule name
    #[error("Unknown treatment rule: {0:?}")]
    UnknownTreatmentRule(String),

    /// Unrecognized instrument spec name
    #[error("Unknown instrument spec: {0:?}")]
    UnknownInstrumentSpec(String),

    /// Winsorization bounds outside `0 <= lower < upper <= 1`
    #[error("Invalid winsorization bounds: lower {lower}, upper {upper}")]
    InvalidWinsorBounds {
        /// Lower quantile
        lower: f64,
        /// Upper quantile
        upper: f64,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PanelError {
    /// Build a [`PanelError::MissingColumns`] from borrowed names.
    pub fn missing_columns(table: &str, columns: &[&str]) -> Self {
        Self::MissingColumns {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_every_column() {
        let err = PanelError::missing_columns("custom_events", &["firm_id", "event_quarter"]);
        assert_eq!(
            err.to_string(),
            "Table 'custom_events' is missing required columns: firm_id, event_quarter"
        );
    }

    #[test]
    fn test_malformed_period_message() {
        let err = PanelError::MalformedPeriod("2020Q5".to_string());
        assert!(err.to_string().contains("\"2020Q5\""));
    }
}
