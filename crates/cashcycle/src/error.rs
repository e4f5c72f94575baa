//! Error types for the file-driven pipeline.

use cashcycle_data::DataError;
use cashcycle_output::ExportError;
use cashcycle_panel::PanelError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading or validating inputs failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Panel assembly failed
    #[error(transparent)]
    Panel(#[from] PanelError),

    /// Writing outputs failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Config file could not be read
    #[error("Cannot read config {path}: {source}")]
    ConfigIo {
        /// Config file path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the schema
    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        /// Config file path
        path: String,
        /// Underlying error
        source: serde_json::Error,
    },
}
