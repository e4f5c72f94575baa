//! CSV Loader
//!
//! Reads the raw input files into frames. Headers are checked before any row
//! is parsed, so a missing column fails with the full list of absent names.
//! Identifier columns stay text (industry `31` is a code, not a number) and
//! empty cells become nulls.

use crate::error::{DataError, Result};
use cashcycle_panel::columns::{
    ADOPTION_COLUMNS, EVENT_QUARTER, FINANCIAL_COLUMNS, FIRM_ID, INDUSTRY, QUARTER, WAVE,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// How a column's cells are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Kept verbatim
    Text,
    /// Parsed as `f64`
    Number,
}

/// A column the loader extracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Header name
    pub name: String,
    /// Cell parsing
    pub kind: ColumnKind,
    /// Whether a file without this header is rejected
    pub required: bool,
}

impl ColumnSpec {
    fn new(name: &str, kind: ColumnKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required,
        }
    }
}

/// The columns one input file contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Build a schema from explicit column specs.
    pub const fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Financial line items, with an optional industry column.
    pub fn financials() -> Self {
        let mut columns: Vec<ColumnSpec> = FINANCIAL_COLUMNS
            .iter()
            .map(|name| ColumnSpec::new(name, kind_of(name), true))
            .collect();
        columns.push(ColumnSpec::new(INDUSTRY, ColumnKind::Text, false));
        Self::new(columns)
    }

    /// Macro series with the shock under `shock_column`.
    pub fn macro_series(shock_column: &str) -> Self {
        Self::new(vec![
            ColumnSpec::new(QUARTER, ColumnKind::Text, true),
            ColumnSpec::new(shock_column, ColumnKind::Number, true),
        ])
    }

    /// IT-adoption scores. An industry column is picked up when present.
    pub fn adoption() -> Self {
        let mut columns: Vec<ColumnSpec> = ADOPTION_COLUMNS
            .iter()
            .map(|name| ColumnSpec::new(name, kind_of(name), true))
            .collect();
        columns.push(ColumnSpec::new(INDUSTRY, ColumnKind::Text, false));
        Self::new(columns)
    }

    /// Custom treatment events.
    pub fn custom_events() -> Self {
        Self::new(vec![
            ColumnSpec::new(FIRM_ID, ColumnKind::Text, true),
            ColumnSpec::new(EVENT_QUARTER, ColumnKind::Text, true),
        ])
    }

    /// Industry adoption waves.
    pub fn industry_waves() -> Self {
        Self::new(vec![
            ColumnSpec::new(INDUSTRY, ColumnKind::Text, true),
            ColumnSpec::new(QUARTER, ColumnKind::Text, true),
            ColumnSpec::new(WAVE, ColumnKind::Number, true),
        ])
    }

    /// The column specs.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}

fn kind_of(name: &str) -> ColumnKind {
    match name {
        FIRM_ID | QUARTER | INDUSTRY | EVENT_QUARTER => ColumnKind::Text,
        _ => ColumnKind::Number,
    }
}

enum Buffer {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
}

/// Read `path` into a frame holding the schema's columns, in schema order.
///
/// Optional columns absent from the file are left out of the frame.
///
/// # Errors
///
/// Fails on IO/CSV errors, absent required headers, and numeric cells that do
/// not parse.
pub fn read_table(path: impl AsRef<Path>, schema: &TableSchema) -> Result<DataFrame> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();

    let missing: Vec<String> = schema
        .columns
        .iter()
        .filter(|spec| spec.required && position(&headers, &spec.name).is_none())
        .map(|spec| spec.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns {
            path: shown,
            columns: missing,
        });
    }

    let present: Vec<(&ColumnSpec, usize)> = schema
        .columns
        .iter()
        .filter_map(|spec| position(&headers, &spec.name).map(|idx| (spec, idx)))
        .collect();
    let mut buffers: Vec<Buffer> = present
        .iter()
        .map(|(spec, _)| match spec.kind {
            ColumnKind::Text => Buffer::Text(Vec::new()),
            ColumnKind::Number => Buffer::Number(Vec::new()),
        })
        .collect();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        for ((spec, idx), buffer) in present.iter().zip(buffers.iter_mut()) {
            let cell = record.get(*idx).unwrap_or("");
            match buffer {
                Buffer::Text(values) => {
                    values.push((!cell.is_empty()).then(|| cell.to_string()));
                }
                Buffer::Number(values) => {
                    values.push(parse_number(cell).ok_or_else(|| DataError::Parse {
                        path: shown.clone(),
                        line,
                        column: spec.name.clone(),
                        value: cell.to_string(),
                    })?);
                }
            }
        }
    }

    let columns: Vec<Column> = present
        .iter()
        .zip(buffers)
        .map(|((spec, _), buffer)| match buffer {
            Buffer::Text(values) => Series::new(spec.name.as_str().into(), values).into(),
            Buffer::Number(values) => Series::new(spec.name.as_str().into(), values).into(),
        })
        .collect();
    let frame = DataFrame::new(columns)?;
    debug!(path = %shown, rows = frame.height(), "loaded table");

    Ok(frame)
}

fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Empty and `NA`/`NaN` cells are missing; anything else must parse.
fn parse_number(cell: &str) -> Option<Option<f64>> {
    match cell {
        "" | "NA" | "NaN" | "nan" => Some(None),
        _ => cell.parse::<f64>().ok().map(Some),
    }
}

/// Load the financial file.
pub fn load_financials(path: impl AsRef<Path>) -> Result<DataFrame> {
    read_table(path, &TableSchema::financials())
}

/// Load the macro file, reading the shock from `shock_column`.
pub fn load_macro(path: impl AsRef<Path>, shock_column: &str) -> Result<DataFrame> {
    read_table(path, &TableSchema::macro_series(shock_column))
}

/// Load the adoption score file.
pub fn load_adoption(path: impl AsRef<Path>) -> Result<DataFrame> {
    read_table(path, &TableSchema::adoption())
}

/// Load a custom event file.
pub fn load_custom_events(path: impl AsRef<Path>) -> Result<DataFrame> {
    read_table(path, &TableSchema::custom_events())
}

/// Load an industry wave file.
pub fn load_industry_waves(path: impl AsRef<Path>) -> Result<DataFrame> {
    read_table(path, &TableSchema::industry_waves())
}
