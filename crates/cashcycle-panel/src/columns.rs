//! Column names shared by every stage of the panel build.

use crate::error::{PanelError, Result};
use polars::prelude::*;

/// Firm identifier.
pub const FIRM_ID: &str = "firm_id";
/// Quarter label (`YYYYQ#`).
pub const QUARTER: &str = "quarter";
/// Industry code.
pub const INDUSTRY: &str = "industry";
/// Net sales.
pub const SALES: &str = "sales";
/// Cost of goods sold.
pub const COGS: &str = "cogs";
/// Inventory balance.
pub const INVENTORY: &str = "inventory";
/// Accounts receivable balance.
pub const RECEIVABLES: &str = "receivables";
/// Accounts payable balance.
pub const PAYABLES: &str = "payables";
/// IT-adoption score.
pub const IT_INDEX: &str = "it_index";
/// Default name of the macro shock column.
pub const SHOCK_VALUE: &str = "shock_value";

/// Days inventory outstanding.
pub const DIO: &str = "DIO";
/// Days sales outstanding.
pub const DSO: &str = "DSO";
/// Days payables outstanding.
pub const DPO: &str = "DPO";
/// Cash conversion cycle.
pub const CCC: &str = "CCC";
/// Adoption score lagged one quarter.
pub const IT_LAG1: &str = "IT_lag1";
/// Dense quarter index.
pub const Q_INDEX: &str = "q_index";
/// Treatment indicator.
pub const TREAT: &str = "treat";
/// Offset from the first treated quarter.
pub const EVENT_TIME: &str = "event_time";

/// Custom event table: event quarter per firm.
pub const EVENT_QUARTER: &str = "event_quarter";
/// Industry wave table: wave indicator.
pub const WAVE: &str = "wave";

/// Financial input columns, industry excluded.
pub const FINANCIAL_COLUMNS: &[&str] =
    &[FIRM_ID, QUARTER, SALES, COGS, INVENTORY, RECEIVABLES, PAYABLES];

/// Adoption input columns.
pub const ADOPTION_COLUMNS: &[&str] = &[FIRM_ID, QUARTER, IT_INDEX];

/// Ratio columns in the order they are winsorized.
pub const RATIO_COLUMNS: &[&str] = &[CCC, DIO, DSO, DPO];

/// Fail with [`PanelError::MissingColumns`] unless `frame` has every column in `required`.
pub fn require_columns(frame: &DataFrame, table: &str, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| frame.get_column_index(name).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PanelError::missing_columns(table, &missing))
    }
}

/// True when `frame` has an industry column with at least one non-null value.
pub fn has_industry(frame: &DataFrame) -> bool {
    frame
        .column(INDUSTRY)
        .map(|c| c.null_count() < c.len())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns_reports_only_missing() {
        let df = DataFrame::new(vec![
            Series::new(FIRM_ID.into(), ["a"]).into(),
            Series::new(QUARTER.into(), ["2020Q1"]).into(),
        ])
        .unwrap();

        assert!(require_columns(&df, "fin", &[FIRM_ID, QUARTER]).is_ok());

        let err = require_columns(&df, "fin", FINANCIAL_COLUMNS).unwrap_err();
        match err {
            PanelError::MissingColumns { table, columns } => {
                assert_eq!(table, "fin");
                assert_eq!(
                    columns,
                    vec!["sales", "cogs", "inventory", "receivables", "payables"]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_has_industry() {
        let empty = DataFrame::new(vec![
            Series::new(INDUSTRY.into(), [None::<&str>, None]).into(),
        ])
        .unwrap();
        assert!(!has_industry(&empty));

        let populated = DataFrame::new(vec![
            Series::new(INDUSTRY.into(), [None, Some("31")]).into(),
        ])
        .unwrap();
        assert!(has_industry(&populated));

        let absent =
            DataFrame::new(vec![Series::new(FIRM_ID.into(), ["a"]).into()]).unwrap();
        assert!(!has_industry(&absent));
    }
}
