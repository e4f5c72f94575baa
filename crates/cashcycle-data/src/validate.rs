//! Schema validation of raw input frames.
//!
//! Runs before the assembler and collects every row-level problem instead of
//! stopping at the first: malformed quarter labels, empty firm ids, missing,
//! negative or non-finite amounts, non-finite shock values and non-finite IT
//! scores.

use crate::error::{DataError, Result, ValidationIssue};
use cashcycle_panel::Quarter;
use cashcycle_panel::columns::{
    ADOPTION_COLUMNS, COGS, FINANCIAL_COLUMNS, FIRM_ID, INVENTORY, IT_INDEX, PAYABLES, QUARTER,
    RECEIVABLES, SALES, require_columns,
};
use polars::prelude::*;
use tracing::{info, warn};

const AMOUNT_COLUMNS: [&str; 5] = [SALES, COGS, INVENTORY, RECEIVABLES, PAYABLES];

/// Row counts of a validated input set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Rows in the financial table
    pub financial_rows: usize,
    /// Rows in the macro table
    pub macro_rows: usize,
    /// Rows in the adoption table, when it was checked
    pub adoption_rows: Option<usize>,
}

struct Collector<'a> {
    table: &'a str,
    issues: Vec<ValidationIssue>,
}

impl<'a> Collector<'a> {
    const fn new(table: &'a str) -> Self {
        Self {
            table,
            issues: Vec::new(),
        }
    }

    fn push(&mut self, row: usize, column: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            table: self.table.to_string(),
            row,
            column: column.to_string(),
            message: message.into(),
        });
    }

    fn check_quarters(&mut self, frame: &DataFrame) -> Result<()> {
        let labels = frame.column(QUARTER)?.cast(&DataType::String)?;
        for (row, label) in labels.str()?.into_iter().enumerate() {
            match label {
                None => self.push(row, QUARTER, "is missing"),
                Some(label) if Quarter::parse(label).is_err() => {
                    self.push(row, QUARTER, format!("{label:?} is not YYYYQ1..YYYYQ4"));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn check_firm_ids(&mut self, frame: &DataFrame) -> Result<()> {
        let ids = frame.column(FIRM_ID)?.cast(&DataType::String)?;
        for (row, id) in ids.str()?.into_iter().enumerate() {
            if id.is_none_or(|id| id.trim().is_empty()) {
                self.push(row, FIRM_ID, "is empty");
            }
        }
        Ok(())
    }

    /// Every value present and finite; negative values rejected when `non_negative`.
    fn check_numbers(&mut self, frame: &DataFrame, column: &str, non_negative: bool) -> Result<()> {
        let values = frame.column(column)?.cast(&DataType::Float64)?;
        for (row, value) in values.f64()?.into_iter().enumerate() {
            match value {
                None => self.push(row, column, "is missing"),
                Some(v) if !v.is_finite() => self.push(row, column, format!("{v} is not finite")),
                Some(v) if non_negative && v < 0.0 => {
                    self.push(row, column, format!("{v} is negative"));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// Problems in the financial table.
///
/// # Errors
///
/// Fails only when required columns are absent or cannot be cast.
pub fn check_financials(frame: &DataFrame) -> Result<Vec<ValidationIssue>> {
    require_columns(frame, "financials", FINANCIAL_COLUMNS)?;

    let mut collector = Collector::new("financials");
    collector.check_firm_ids(frame)?;
    collector.check_quarters(frame)?;
    for column in AMOUNT_COLUMNS {
        collector.check_numbers(frame, column, true)?;
    }
    Ok(collector.finish())
}

/// Problems in the macro table.
pub fn check_macro(frame: &DataFrame, shock_column: &str) -> Result<Vec<ValidationIssue>> {
    require_columns(frame, "macro", &[QUARTER, shock_column])?;

    let mut collector = Collector::new("macro");
    collector.check_quarters(frame)?;
    collector.check_numbers(frame, shock_column, false)?;
    Ok(collector.finish())
}

/// Problems in the adoption table. Missing scores are allowed.
pub fn check_adoption(frame: &DataFrame) -> Result<Vec<ValidationIssue>> {
    require_columns(frame, "adoption", ADOPTION_COLUMNS)?;

    let mut collector = Collector::new("adoption");
    collector.check_firm_ids(frame)?;
    collector.check_quarters(frame)?;

    let scores = frame.column(IT_INDEX)?.cast(&DataType::Float64)?;
    for (row, value) in scores.f64()?.into_iter().enumerate() {
        if let Some(v) = value.filter(|v| !v.is_finite()) {
            collector.push(row, IT_INDEX, format!("{v} is not finite"));
        }
    }
    Ok(collector.finish())
}

/// Validate the financial and macro tables, and the adoption table when given.
///
/// # Errors
///
/// [`DataError::Validation`] with every problem found across the tables.
pub fn validate_inputs(
    financials: &DataFrame,
    macro_series: &DataFrame,
    adoption: Option<&DataFrame>,
    shock_column: &str,
) -> Result<ValidationSummary> {
    let mut issues = check_financials(financials)?;
    issues.extend(check_macro(macro_series, shock_column)?);
    if let Some(adoption) = adoption {
        issues.extend(check_adoption(adoption)?);
    }

    if !issues.is_empty() {
        warn!(problems = issues.len(), "input validation failed");
        return Err(DataError::Validation(issues));
    }

    let summary = ValidationSummary {
        financial_rows: financials.height(),
        macro_rows: macro_series.height(),
        adoption_rows: adoption.map(DataFrame::height),
    };
    info!(
        financial_rows = summary.financial_rows,
        macro_rows = summary.macro_rows,
        adoption_rows = ?summary.adoption_rows,
        "inputs validated"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashcycle_panel::PanelError;

    fn financials(quarters: &[&str], sales: &[Option<f64>]) -> DataFrame {
        let n = quarters.len();
        DataFrame::new(vec![
            Series::new(FIRM_ID.into(), vec!["a"; n]).into(),
            Series::new(QUARTER.into(), quarters).into(),
            Series::new(SALES.into(), sales).into(),
            Series::new(COGS.into(), vec![60.0; n]).into(),
            Series::new(INVENTORY.into(), vec![10.0; n]).into(),
            Series::new(RECEIVABLES.into(), vec![20.0; n]).into(),
            Series::new(PAYABLES.into(), vec![5.0; n]).into(),
        ])
        .unwrap()
    }

    fn macro_series(quarters: &[&str], shocks: &[f64]) -> DataFrame {
        DataFrame::new(vec![
            Series::new(QUARTER.into(), quarters).into(),
            Series::new("gscpi".into(), shocks).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_clean_inputs_pass() {
        let fin = financials(&["2020Q1", "2020Q2"], &[Some(100.0), Some(0.0)]);
        let mac = macro_series(&["2020Q1", "2020Q2"], &[-0.3, 1.2]);

        let summary = validate_inputs(&fin, &mac, None, "gscpi").unwrap();
        assert_eq!(
            summary,
            ValidationSummary {
                financial_rows: 2,
                macro_rows: 2,
                adoption_rows: None,
            }
        );
    }

    #[test]
    fn test_every_problem_is_reported() {
        let fin = financials(
            &["2020Q1", "2020Q5", "20-Q1"],
            &[Some(-1.0), None, Some(f64::INFINITY)],
        );
        let mac = macro_series(&["2020Q1"], &[f64::NAN]);

        let err = validate_inputs(&fin, &mac, None, "gscpi").unwrap_err();
        let DataError::Validation(issues) = err else {
            panic!("expected validation error, got {err}");
        };

        let located: Vec<(&str, usize, &str)> = issues
            .iter()
            .map(|i| (i.table.as_str(), i.row, i.column.as_str()))
            .collect();
        assert_eq!(
            located,
            [
                ("financials", 1, QUARTER),
                ("financials", 2, QUARTER),
                ("financials", 0, SALES),
                ("financials", 1, SALES),
                ("financials", 2, SALES),
                ("macro", 0, "gscpi"),
            ]
        );
        assert_eq!(issues[2].message, "-1 is negative");
        assert_eq!(issues[3].message, "is missing");
    }

    #[test]
    fn test_empty_firm_id() {
        let mut fin = financials(&["2020Q1", "2020Q2"], &[Some(1.0), Some(1.0)]);
        fin.with_column(Series::new(FIRM_ID.into(), ["a", " "]))
            .unwrap();

        let issues = check_financials(&fin).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].to_string(), "financials row 1: firm_id is empty");
    }

    #[test]
    fn test_missing_columns_are_not_row_problems() {
        let mac = macro_series(&["2020Q1"], &[0.1]);
        assert!(matches!(
            check_macro(&mac, "shock_value"),
            Err(DataError::Panel(PanelError::MissingColumns { .. }))
        ));
    }

    fn adoption(quarters: &[&str], scores: &[Option<f64>]) -> DataFrame {
        DataFrame::new(vec![
            Series::new(FIRM_ID.into(), vec!["a"; quarters.len()]).into(),
            Series::new(QUARTER.into(), quarters).into(),
            Series::new(IT_INDEX.into(), scores).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_adoption_allows_missing_scores() {
        let df = adoption(&["2020Q1", "2020Q2"], &[None, Some(f64::NAN)]);

        let issues = check_adoption(&df).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].row, 1);
    }

    #[test]
    fn test_adoption_problems_join_the_report() {
        let fin = financials(&["2020Q1"], &[Some(100.0)]);
        let mac = macro_series(&["2020Q1"], &[0.2]);
        let it = adoption(&["2020Q1", "2020Q9"], &[Some(0.4), None]);

        let err = validate_inputs(&fin, &mac, Some(&it), "gscpi").unwrap_err();
        let DataError::Validation(issues) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].table, "adoption");
        assert_eq!(issues[0].column, QUARTER);

        let it = adoption(&["2020Q1", "2020Q2"], &[Some(0.4), None]);
        let summary = validate_inputs(&fin, &mac, Some(&it), "gscpi").unwrap();
        assert_eq!(summary.adoption_rows, Some(2));
    }
}
