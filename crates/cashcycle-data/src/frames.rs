//! Record slices to column-oriented frames.

use crate::error::Result;
use crate::records::{AdoptionRecord, FinancialRecord, MacroRecord, WaveRecord};
use cashcycle_panel::columns::{
    COGS, FIRM_ID, INDUSTRY, INVENTORY, IT_INDEX, PAYABLES, QUARTER, RECEIVABLES, SALES, WAVE,
};
use polars::prelude::*;

fn text<T>(records: &[T], field: impl Fn(&T) -> &str) -> Vec<String> {
    records.iter().map(|r| field(r).to_string()).collect()
}

fn numbers<T>(records: &[T], field: impl Fn(&T) -> f64) -> Vec<f64> {
    records.iter().map(field).collect()
}

/// Financial frame; the industry column is always present, null where unknown.
pub fn financial_frame(records: &[FinancialRecord]) -> Result<DataFrame> {
    let industry: Vec<Option<String>> = records.iter().map(|r| r.industry.clone()).collect();

    let df = DataFrame::new(vec![
        Series::new(FIRM_ID.into(), text(records, |r| r.firm_id.as_str())).into(),
        Series::new(QUARTER.into(), text(records, |r| r.quarter.as_str())).into(),
        Series::new(INDUSTRY.into(), industry).into(),
        Series::new(SALES.into(), numbers(records, |r| r.sales)).into(),
        Series::new(COGS.into(), numbers(records, |r| r.cogs)).into(),
        Series::new(INVENTORY.into(), numbers(records, |r| r.inventory)).into(),
        Series::new(RECEIVABLES.into(), numbers(records, |r| r.receivables)).into(),
        Series::new(PAYABLES.into(), numbers(records, |r| r.payables)).into(),
    ])?;
    Ok(df)
}

/// Macro frame with the shock stored under `shock_column`.
pub fn macro_frame(records: &[MacroRecord], shock_column: &str) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new(QUARTER.into(), text(records, |r| r.quarter.as_str())).into(),
        Series::new(shock_column.into(), numbers(records, |r| r.shock_value)).into(),
    ])?;
    Ok(df)
}

/// Adoption frame.
pub fn adoption_frame(records: &[AdoptionRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new(FIRM_ID.into(), text(records, |r| r.firm_id.as_str())).into(),
        Series::new(QUARTER.into(), text(records, |r| r.quarter.as_str())).into(),
        Series::new(IT_INDEX.into(), numbers(records, |r| r.it_index)).into(),
    ])?;
    Ok(df)
}

/// Industry wave frame.
pub fn wave_frame(records: &[WaveRecord]) -> Result<DataFrame> {
    let waves: Vec<i64> = records.iter().map(|r| r.wave).collect();

    let df = DataFrame::new(vec![
        Series::new(INDUSTRY.into(), text(records, |r| r.industry.as_str())).into(),
        Series::new(QUARTER.into(), text(records, |r| r.quarter.as_str())).into(),
        Series::new(WAVE.into(), waves).into(),
    ])?;
    Ok(df)
}
