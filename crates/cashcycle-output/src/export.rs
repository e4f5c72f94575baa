//! Export of the assembled panel.
//!
//! The panel leaves the pipeline as a flat CSV table (undefined values as
//! empty cells) or as a JSON array of row objects (undefined values as
//! `null`).

use polars::prelude::*;
use serde_json::{Map, Number, Value};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Text of one CSV cell; null is the empty string.
fn csv_cell(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(v) if v.is_nan() => String::new(),
        AnyValue::Float64(v) => v.to_string(),
        AnyValue::Float32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Boolean(v) => v.to_string(),
        other => other.to_string(),
    }
}

fn json_value(value: &AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Float64(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        AnyValue::Float32(v) => Number::from_f64(f64::from(*v)).map_or(Value::Null, Value::Number),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Boolean(v) => Value::Bool(*v),
        other => Value::String(other.to_string()),
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, ExportError> {
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

impl Exporter for DataFrame {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        let columns = self.get_columns();

        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(self.get_column_names().iter().map(|n| n.as_str()))?;
                for row in 0..self.height() {
                    let mut record = Vec::with_capacity(columns.len());
                    for column in columns {
                        record.push(csv_cell(&column.get(row)?));
                    }
                    wtr.write_record(&record)?;
                }
                utf8(wtr.into_inner().map_err(|e| e.into_error())?)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                let mut rows = Vec::with_capacity(self.height());
                for row in 0..self.height() {
                    let mut object = Map::new();
                    for column in columns {
                        object.insert(column.name().to_string(), json_value(&column.get(row)?));
                    }
                    rows.push(Value::Object(object));
                }
                let rows = Value::Array(rows);
                if format == ExportFormat::Json {
                    Ok(serde_json::to_string(&rows)?)
                } else {
                    Ok(serde_json::to_string_pretty(&rows)?)
                }
            }
        }
    }
}

/// Write the panel table as CSV to `path`, returning the number of data rows.
///
/// # Errors
///
/// Returns an error if a cell cannot be read or the file cannot be written.
pub fn write_panel_csv(frame: &DataFrame, path: &Path) -> Result<usize, ExportError> {
    frame.export_to_file(path, ExportFormat::Csv)?;
    info!(path = %path.display(), rows = frame.height(), "wrote panel");
    Ok(frame.height())
}
