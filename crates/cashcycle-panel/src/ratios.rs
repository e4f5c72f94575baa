//! Ratio Engine
//!
//! Working-capital ratios in days:
//!
//! - `DIO = 365 * inventory / cogs`
//! - `DSO = 365 * receivables / sales`
//! - `DPO = 365 * payables / cogs`
//! - `CCC = DIO + DSO - DPO`
//!
//! A zero denominator means zero activity, which leaves the ratio undefined
//! (null) rather than infinite. Nulls propagate into `CCC`.

use crate::columns::{CCC, COGS, DIO, DPO, DSO, INVENTORY, PAYABLES, RECEIVABLES, SALES};
use polars::prelude::*;

/// Days in the year used to annualize the ratios.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// `365 * balance / flow`, null when `flow` is zero or missing.
pub fn days_outstanding(balance: &str, flow: &str) -> Expr {
    when(col(flow).neq(lit(0.0)))
        .then(
            lit(DAYS_PER_YEAR) * col(balance).cast(DataType::Float64)
                / col(flow).cast(DataType::Float64),
        )
        .otherwise(lit(NULL))
}

/// Add `DIO`, `DSO`, `DPO` and `CCC` to a frame holding the raw line items.
pub fn compute_ratios(data: LazyFrame) -> LazyFrame {
    data.with_columns([
        days_outstanding(INVENTORY, COGS).alias(DIO),
        days_outstanding(RECEIVABLES, SALES).alias(DSO),
        days_outstanding(PAYABLES, COGS).alias(DPO),
    ])
    .with_columns([(col(DIO) + col(DSO) - col(DPO)).alias(CCC)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_items(cogs: Vec<f64>, sales: Vec<f64>) -> DataFrame {
        let n = cogs.len();
        DataFrame::new(vec![
            Series::new(SALES.into(), sales).into(),
            Series::new(COGS.into(), cogs).into(),
            Series::new(INVENTORY.into(), vec![100.0; n]).into(),
            Series::new(RECEIVABLES.into(), vec![50.0; n]).into(),
            Series::new(PAYABLES.into(), vec![20.0; n]).into(),
        ])
        .unwrap()
    }

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_ratio_formulas() {
        let df = compute_ratios(line_items(vec![365.0], vec![730.0]).lazy())
            .collect()
            .unwrap();

        let dio = values(&df, DIO)[0].unwrap();
        let dso = values(&df, DSO)[0].unwrap();
        let dpo = values(&df, DPO)[0].unwrap();
        let ccc = values(&df, CCC)[0].unwrap();

        assert_relative_eq!(dio, 100.0);
        assert_relative_eq!(dso, 25.0);
        assert_relative_eq!(dpo, 20.0);
        assert_relative_eq!(ccc, 105.0);
    }

    #[test]
    fn test_zero_cogs_leaves_dio_dpo_ccc_undefined() {
        let df = compute_ratios(line_items(vec![365.0, 0.0, 730.0], vec![730.0; 3]).lazy())
            .collect()
            .unwrap();

        let dio = values(&df, DIO);
        let dpo = values(&df, DPO);
        let dso = values(&df, DSO);
        let ccc = values(&df, CCC);

        assert!(dio[1].is_none());
        assert!(dpo[1].is_none());
        assert!(ccc[1].is_none());
        // DSO does not depend on cogs
        assert!(dso[1].is_some());

        for row in [0, 2] {
            assert!(dio[row].is_some_and(f64::is_finite));
            assert!(dpo[row].is_some_and(f64::is_finite));
            assert!(ccc[row].is_some_and(f64::is_finite));
        }
    }

    #[test]
    fn test_zero_sales_leaves_dso_undefined() {
        let df = compute_ratios(line_items(vec![365.0], vec![0.0]).lazy())
            .collect()
            .unwrap();

        assert!(values(&df, DSO)[0].is_none());
        assert!(values(&df, DIO)[0].is_some());
        assert!(values(&df, CCC)[0].is_none());
    }
}
