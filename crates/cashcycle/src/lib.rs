#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cashcycle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use cashcycle_data as data;
pub use cashcycle_output as output;
pub use cashcycle_panel as panel;

pub use config::{IvConfig, PathsConfig, PipelineConfig, RunConfig, TreatConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineOutcome, load_inputs, run_pipeline};

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
