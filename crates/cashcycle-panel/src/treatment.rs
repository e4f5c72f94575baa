//! Treatment Assigner
//!
//! Sets the `treat` column (Int32, 0 or 1) under one of three rules chosen at
//! configuration time. Each rule is a separate function with its own input
//! checks; [`assign_treatment`] is the single dispatch point.

use crate::columns::{
    EVENT_QUARTER, FIRM_ID, INDUSTRY, Q_INDEX, QUARTER, TREAT, has_industry, require_columns,
};
use crate::error::{PanelError, Result};
use crate::quarter::{Quarter, QuarterIndex};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default shock threshold for [`TreatmentRule::GscpiThreshold`].
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Cross-sectional quantile used by [`TreatmentRule::IndustryTopDecile`].
pub const TOP_DECILE: f64 = 0.9;

const EVENT_Q_INDEX: &str = "__event_q_index";

/// How treatment is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TreatmentRule {
    /// Treated from the first quarter whose shock exceeds a fixed threshold
    #[default]
    #[serde(rename = "gscpi_thresh")]
    GscpiThreshold,
    /// Treated when the shock is in the top decile of that quarter's cross-section
    #[serde(rename = "industry_topdecile")]
    IndustryTopDecile,
    /// Treated from a per-firm event quarter supplied externally
    #[serde(rename = "custom_dates")]
    CustomDates,
}

impl TreatmentRule {
    /// Every rule, in declaration order.
    pub const ALL: [Self; 3] = [
        Self::GscpiThreshold,
        Self::IndustryTopDecile,
        Self::CustomDates,
    ];

    /// Configuration name of the rule.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GscpiThreshold => "gscpi_thresh",
            Self::IndustryTopDecile => "industry_topdecile",
            Self::CustomDates => "custom_dates",
        }
    }
}

impl fmt::Display for TreatmentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TreatmentRule {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.name() == s)
            .ok_or_else(|| PanelError::UnknownTreatmentRule(s.to_string()))
    }
}

/// Everything a rule may read besides the panel itself.
#[derive(Debug, Clone, Copy)]
pub struct TreatmentInputs<'a> {
    /// Name of the shock column in the panel
    pub shock_column: &'a str,
    /// Threshold for [`TreatmentRule::GscpiThreshold`]
    pub threshold: f64,
    /// Event table for [`TreatmentRule::CustomDates`]
    pub custom_events: Option<&'a DataFrame>,
    /// Quarter index the panel's `q_index` column was built with
    pub index: QuarterIndex,
}

/// Add the `treat` column according to `rule`.
pub fn assign_treatment(
    frame: DataFrame,
    rule: TreatmentRule,
    inputs: &TreatmentInputs<'_>,
) -> Result<DataFrame> {
    match rule {
        TreatmentRule::GscpiThreshold => {
            treat_above_threshold(frame, inputs.shock_column, inputs.threshold)
        }
        TreatmentRule::IndustryTopDecile => treat_industry_top_decile(frame, inputs.shock_column),
        TreatmentRule::CustomDates => {
            let events = inputs.custom_events.ok_or(PanelError::MissingCustomEvents)?;
            treat_custom_dates(frame, events, &inputs.index)
        }
    }
}

fn indicator(condition: Expr) -> Expr {
    when(condition)
        .then(lit(1))
        .otherwise(lit(0))
        .cast(DataType::Int32)
        .alias(TREAT)
}

/// `gscpi_thresh`: treated from the firm's first row whose shock is strictly
/// above `threshold`, and on every later row.
pub fn treat_above_threshold(
    frame: DataFrame,
    shock_column: &str,
    threshold: f64,
) -> Result<DataFrame> {
    require_columns(&frame, "panel", &[FIRM_ID, Q_INDEX, shock_column])?;

    let first_crossing = when(col(shock_column).gt(lit(threshold)))
        .then(col(Q_INDEX))
        .otherwise(lit(NULL))
        .min()
        .over([col(FIRM_ID)]);

    let result = frame
        .lazy()
        .with_column(indicator(col(Q_INDEX).gt_eq(first_crossing)))
        .collect()?;

    Ok(result)
}

/// `industry_topdecile`: treated when the shock is at or above the 90th
/// percentile of shocks among rows with an industry code in the same quarter.
///
/// Rows without an industry code are outside the cross-section and stay
/// untreated.
pub fn treat_industry_top_decile(frame: DataFrame, shock_column: &str) -> Result<DataFrame> {
    require_columns(&frame, "panel", &[QUARTER, shock_column])?;
    if !has_industry(&frame) {
        return Err(PanelError::MissingIndustry {
            operation: TreatmentRule::IndustryTopDecile.name().to_string(),
        });
    }

    let quarter_threshold = when(col(INDUSTRY).is_not_null())
        .then(col(shock_column))
        .otherwise(lit(NULL))
        .quantile(lit(TOP_DECILE), QuantileMethod::Linear)
        .over([col(QUARTER)]);

    let result = frame
        .lazy()
        .with_column(indicator(
            col(INDUSTRY)
                .is_not_null()
                .and(col(shock_column).gt_eq(quarter_threshold)),
        ))
        .collect()?;

    Ok(result)
}

/// Earliest event quarter per firm, as indices on the panel's quarter line.
fn event_indices(events: &DataFrame, index: &QuarterIndex) -> Result<DataFrame> {
    require_columns(events, "custom_events", &[FIRM_ID, EVENT_QUARTER])?;

    let firms = events.column(FIRM_ID)?.cast(&DataType::String)?;
    let labels = events.column(EVENT_QUARTER)?.cast(&DataType::String)?;

    let mut earliest: BTreeMap<&str, Quarter> = BTreeMap::new();
    for (firm, label) in firms.str()?.into_iter().zip(labels.str()?) {
        let (Some(firm), Some(label)) = (firm, label) else {
            continue;
        };
        let quarter = Quarter::parse(label)?;
        earliest
            .entry(firm)
            .and_modify(|q| *q = (*q).min(quarter))
            .or_insert(quarter);
    }

    let firm_ids: Vec<&str> = earliest.keys().copied().collect();
    let q_indices: Vec<i64> = earliest.values().map(|q| index.index_of(q)).collect();

    let table = DataFrame::new(vec![
        Series::new(FIRM_ID.into(), firm_ids).into(),
        Series::new(EVENT_Q_INDEX.into(), q_indices).into(),
    ])?;

    Ok(table)
}

/// `custom_dates`: treated from the firm's event quarter on. Firms absent from
/// the event table are never treated; a firm listed twice uses its earliest
/// event quarter.
pub fn treat_custom_dates(
    frame: DataFrame,
    events: &DataFrame,
    index: &QuarterIndex,
) -> Result<DataFrame> {
    require_columns(&frame, "panel", &[FIRM_ID, Q_INDEX])?;
    let events = event_indices(events, index)?;

    let result = frame
        .lazy()
        .join(
            events.lazy(),
            [col(FIRM_ID)],
            [col(FIRM_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(indicator(col(Q_INDEX).gt_eq(col(EVENT_Q_INDEX))))
        .collect()?
        .drop(EVENT_Q_INDEX)?;

    Ok(result)
}
