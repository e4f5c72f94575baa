#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cashcycle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frames;
pub mod loader;
pub mod records;
pub mod synthetic;
pub mod validate;
pub mod waves;

pub use error::{DataError, Result, ValidationIssue};
pub use loader::{ColumnKind, ColumnSpec, TableSchema, read_table};
pub use records::{AdoptionRecord, FinancialRecord, MacroRecord, WaveRecord};
pub use synthetic::{SyntheticConfig, SyntheticDataset, SyntheticFiles, generate};
pub use validate::{ValidationSummary, validate_inputs};
pub use waves::{DEFAULT_WAVE_PERCENTILE, derive_industry_waves};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
