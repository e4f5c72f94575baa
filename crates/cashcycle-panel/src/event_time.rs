//! Event-Time Calculator
//!
//! `event_time = q_index - first_treated_q_index`, computed per firm: zero at
//! the firm's first quarter with `treat = 1`, negative before it, positive
//! after it.

use crate::columns::{EVENT_TIME, FIRM_ID, Q_INDEX, TREAT, require_columns};
use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What `event_time` holds for a firm that is never treated.
///
/// Either way, `event_time = 0` only means "first treated quarter" when
/// `treat = 1` on that row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeverTreatedPolicy {
    /// Zero on every row of the firm
    #[default]
    Zero,
    /// Null on every row of the firm
    Null,
}

impl NeverTreatedPolicy {
    /// Configuration name of the policy.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for NeverTreatedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NeverTreatedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Self::Zero),
            "null" => Ok(Self::Null),
            other => Err(format!(
                "unknown never-treated policy: {other:?} (expected zero or null)"
            )),
        }
    }
}

/// Add the `event_time` column (Int64). Requires `firm_id`, `q_index` and `treat`.
pub fn add_event_time(frame: DataFrame, policy: NeverTreatedPolicy) -> Result<DataFrame> {
    require_columns(&frame, "panel", &[FIRM_ID, Q_INDEX, TREAT])?;

    let first_treated = when(col(TREAT).eq(lit(1)))
        .then(col(Q_INDEX))
        .otherwise(lit(NULL))
        .min()
        .over([col(FIRM_ID)]);

    let offset = col(Q_INDEX) - first_treated;
    let event_time = match policy {
        NeverTreatedPolicy::Zero => offset.fill_null(lit(0)),
        NeverTreatedPolicy::Null => offset,
    };

    frame
        .lazy()
        .with_column(event_time.cast(DataType::Int64).alias(EVENT_TIME))
        .collect()
        .map_err(PanelError::from)
}
