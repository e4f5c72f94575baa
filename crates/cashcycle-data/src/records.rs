//! Typed rows of the raw input files.
//!
//! Field names match the CSV headers, so these structs serialize straight to
//! the files the loader reads back.

use serde::{Deserialize, Serialize};

/// One firm-quarter of financial line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    /// Firm identifier
    pub firm_id: String,
    /// Quarter label (`YYYYQ#`)
    pub quarter: String,
    /// Industry code, kept as text
    pub industry: Option<String>,
    /// Net sales
    pub sales: f64,
    /// Cost of goods sold
    pub cogs: f64,
    /// Inventory balance
    pub inventory: f64,
    /// Accounts receivable
    pub receivables: f64,
    /// Accounts payable
    pub payables: f64,
}

/// One quarter of the macro shock series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRecord {
    /// Quarter label
    pub quarter: String,
    /// Shock value
    pub shock_value: f64,
}

/// IT-adoption score of one firm-quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRecord {
    /// Firm identifier
    pub firm_id: String,
    /// Quarter label
    pub quarter: String,
    /// Standardized adoption score
    pub it_index: f64,
}

/// Adoption wave of one industry-quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRecord {
    /// Industry code
    pub industry: String,
    /// Quarter label
    pub quarter: String,
    /// 1 once the industry has adopted, else 0
    pub wave: i64,
}
