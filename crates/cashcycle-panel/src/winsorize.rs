//! Winsorizer
//!
//! Clips a column to quantile bounds computed over the entire column, not per
//! firm or per quarter. Bounds are nearest-rank quantiles, so each bound is a
//! value that occurs in the column and a second pass leaves it unchanged.

use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Lower and upper quantiles used for clipping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinsorBounds {
    /// Lower quantile (default: 0.01)
    pub lower: f64,
    /// Upper quantile (default: 0.99)
    pub upper: f64,
}

impl Default for WinsorBounds {
    fn default() -> Self {
        Self {
            lower: 0.01,
            upper: 0.99,
        }
    }
}

impl WinsorBounds {
    /// Create validated bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check `0 <= lower < upper <= 1`.
    pub fn validate(&self) -> Result<()> {
        if (0.0..=1.0).contains(&self.lower)
            && (0.0..=1.0).contains(&self.upper)
            && self.lower < self.upper
        {
            Ok(())
        } else {
            Err(PanelError::InvalidWinsorBounds {
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}

/// Expression clipping `column` to its own quantile bounds. Nulls stay null.
pub fn winsorize_expr(column: &str, bounds: WinsorBounds) -> Expr {
    let lower = col(column).quantile(lit(bounds.lower), QuantileMethod::Nearest);
    let upper = col(column).quantile(lit(bounds.upper), QuantileMethod::Nearest);

    when(col(column).lt(lower.clone()))
        .then(lower)
        .when(col(column).gt(upper.clone()))
        .then(upper)
        .otherwise(col(column))
        .alias(column)
}

/// Winsorize each of `columns` independently.
pub fn winsorize(data: LazyFrame, columns: &[&str], bounds: WinsorBounds) -> Result<LazyFrame> {
    bounds.validate()?;

    let exprs: Vec<Expr> = columns
        .iter()
        .map(|column| winsorize_expr(column, bounds))
        .collect();

    Ok(data.with_columns(exprs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn clip(values: Vec<Option<f64>>, lower: f64, upper: f64) -> Vec<Option<f64>> {
        let df = DataFrame::new(vec![Series::new("x".into(), values).into()]).unwrap();
        winsorize(df.lazy(), &["x"], WinsorBounds::new(lower, upper).unwrap())
            .unwrap()
            .collect()
            .unwrap()
            .column("x")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_default_bounds_clip_tails() {
        let values: Vec<Option<f64>> = (0..=100).map(|v| Some(f64::from(v))).collect();
        let clipped = clip(values, 0.01, 0.99);

        assert_eq!(clipped[0], Some(1.0));
        assert_eq!(clipped[1], Some(1.0));
        assert_eq!(clipped[50], Some(50.0));
        assert_eq!(clipped[99], Some(99.0));
        assert_eq!(clipped[100], Some(99.0));
    }

    #[test]
    fn test_outlier_is_pulled_inside_interpolated_range() {
        let clipped = clip(vec![Some(1.0), Some(2.0), Some(3.0), Some(1000.0)], 0.25, 0.75);

        // Linear quartiles are 1.75 and 252.25; nearest-rank bounds sit inside them.
        for v in clipped.iter().flatten() {
            assert!(*v >= 1.75 - 1e-9);
            assert!(*v <= 252.25 + 1e-9);
        }
        assert!(clipped[3].unwrap() < 1000.0);
    }

    #[test]
    fn test_nulls_are_preserved() {
        let clipped = clip(vec![Some(1.0), None, Some(5.0), Some(3.0)], 0.0, 1.0);
        assert_eq!(clipped, vec![Some(1.0), None, Some(5.0), Some(3.0)]);
    }

    #[rstest]
    #[case(0.01, 0.99)]
    #[case(0.05, 0.95)]
    #[case(0.25, 0.75)]
    #[case(0.1, 0.6)]
    fn test_winsorize_is_idempotent(#[case] lower: f64, #[case] upper: f64) {
        let values: Vec<Option<f64>> = [
            -40.0, 3.5, 7.25, 12.0, 12.0, 15.5, 18.0, 19.75, 22.0, 31.0, 44.0, 390.0, -2.0,
        ]
        .into_iter()
        .map(Some)
        .chain([None])
        .collect();

        let once = clip(values, lower, upper);
        let twice = clip(once.clone(), lower, upper);
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case(0.5, 0.5)]
    #[case(0.9, 0.1)]
    #[case(-0.1, 0.9)]
    #[case(0.1, 1.5)]
    #[case(f64::NAN, 0.9)]
    fn test_invalid_bounds(#[case] lower: f64, #[case] upper: f64) {
        assert!(matches!(
            WinsorBounds::new(lower, upper),
            Err(PanelError::InvalidWinsorBounds { .. })
        ));
    }
}
