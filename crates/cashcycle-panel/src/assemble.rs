//! Panel Assembler
//!
//! Orchestrates the full build: ratios, joins, lag, winsorization, treatment,
//! event time, instrument, and the final completeness filter. Every step takes
//! a frame and returns a new one, so a build is a deterministic function of
//! its input tables and its [`PanelConfig`].

use crate::columns::{
    ADOPTION_COLUMNS, CCC, COGS, DIO, DPO, DSO, EVENT_TIME, FINANCIAL_COLUMNS, FIRM_ID, INDUSTRY,
    INVENTORY, IT_INDEX, IT_LAG1, PAYABLES, Q_INDEX, QUARTER, RATIO_COLUMNS, RECEIVABLES, SALES,
    SHOCK_VALUE, TREAT, require_columns,
};
use crate::error::Result;
use crate::event_time::{NeverTreatedPolicy, add_event_time};
use crate::instrument::{DEFAULT_IV_LAG, InstrumentInputs, InstrumentSpec, build_instrument};
use crate::quarter::add_quarter_index;
use crate::ratios::compute_ratios;
use crate::treatment::{DEFAULT_THRESHOLD, TreatmentInputs, TreatmentRule, assign_treatment};
use crate::winsorize::{WinsorBounds, winsorize};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for a panel build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Treatment rule (default: `gscpi_thresh`)
    pub treatment_rule: TreatmentRule,
    /// Shock threshold for `gscpi_thresh` (default: 0.5)
    pub threshold: f64,
    /// Name of the shock column in the macro table (default: `shock_value`)
    pub shock_column: String,
    /// Instrument spec (default: `peer_it_lagK`)
    pub instrument: InstrumentSpec,
    /// Lag depth `K` for `peer_it_lagK` (default: 4)
    pub iv_lag: usize,
    /// Winsorization bounds for the ratio columns (default: 0.01 / 0.99)
    pub winsorize: WinsorBounds,
    /// Event time of never-treated firms (default: zero)
    pub never_treated: NeverTreatedPolicy,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            treatment_rule: TreatmentRule::default(),
            threshold: DEFAULT_THRESHOLD,
            shock_column: SHOCK_VALUE.to_string(),
            instrument: InstrumentSpec::default(),
            iv_lag: DEFAULT_IV_LAG,
            winsorize: WinsorBounds::default(),
            never_treated: NeverTreatedPolicy::default(),
        }
    }
}

/// Input tables of a build.
#[derive(Debug, Clone)]
pub struct PanelInputs {
    /// firm_id, quarter, sales, cogs, inventory, receivables, payables, optional industry
    pub financials: DataFrame,
    /// quarter and the shock column
    pub macro_series: DataFrame,
    /// firm_id, quarter, it_index
    pub adoption: DataFrame,
    /// firm_id, event_quarter (for `custom_dates`)
    pub custom_events: Option<DataFrame>,
    /// industry, quarter, wave (for `industry_wave`)
    pub industry_waves: Option<DataFrame>,
}

impl PanelInputs {
    /// Inputs without auxiliary tables.
    pub const fn new(financials: DataFrame, macro_series: DataFrame, adoption: DataFrame) -> Self {
        Self {
            financials,
            macro_series,
            adoption,
            custom_events: None,
            industry_waves: None,
        }
    }

    /// Attach a custom event table.
    pub fn with_custom_events(mut self, events: DataFrame) -> Self {
        self.custom_events = Some(events);
        self
    }

    /// Attach an industry wave table.
    pub fn with_industry_waves(mut self, waves: DataFrame) -> Self {
        self.industry_waves = Some(waves);
        self
    }
}

/// An assembled panel and its audit counts.
#[derive(Debug, Clone)]
pub struct Panel {
    frame: DataFrame,
    rows_assembled: usize,
    instrument: InstrumentSpec,
}

impl Panel {
    /// The panel table.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the panel, returning the table.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Rows in the emitted panel.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Rows before the completeness filter.
    pub const fn rows_assembled(&self) -> usize {
        self.rows_assembled
    }

    /// Rows removed for missing CCC, IT_lag1 or shock value.
    pub fn rows_dropped(&self) -> usize {
        self.rows_assembled - self.height()
    }

    /// Name of the instrument column.
    pub const fn instrument_column(&self) -> &'static str {
        self.instrument.column()
    }
}

/// Output columns in emission order.
fn output_columns(shock_column: &str, instrument: InstrumentSpec) -> Vec<Expr> {
    [
        FIRM_ID,
        QUARTER,
        INDUSTRY,
        SALES,
        COGS,
        INVENTORY,
        RECEIVABLES,
        PAYABLES,
        DIO,
        DSO,
        DPO,
        CCC,
        IT_INDEX,
        IT_LAG1,
        shock_column,
        Q_INDEX,
        TREAT,
        EVENT_TIME,
        instrument.column(),
    ]
    .into_iter()
    .map(col)
    .collect()
}

/// Build the panel.
///
/// # Errors
///
/// Fails on missing input columns, malformed quarter labels, invalid
/// winsorization bounds, or when the selected rule/spec lacks what it needs
/// (industry codes, event table, wave table).
pub fn assemble_panel(inputs: &PanelInputs, config: &PanelConfig) -> Result<Panel> {
    let shock = config.shock_column.as_str();

    config.winsorize.validate()?;
    require_columns(&inputs.financials, "financials", FINANCIAL_COLUMNS)?;
    require_columns(&inputs.macro_series, "macro", &[QUARTER, shock])?;
    require_columns(&inputs.adoption, "adoption", ADOPTION_COLUMNS)?;

    let mut financials = inputs.financials.clone().lazy();
    if inputs.financials.get_column_index(INDUSTRY).is_none() {
        financials = financials.with_column(lit(NULL).cast(DataType::String).alias(INDUSTRY));
    }

    let adoption = inputs.adoption.clone().lazy().select([
        col(FIRM_ID),
        col(QUARTER),
        col(IT_INDEX).cast(DataType::Float64),
    ]);
    let macro_series = inputs
        .macro_series
        .clone()
        .lazy()
        .select([col(QUARTER), col(shock).cast(DataType::Float64)]);

    // Ratios on the raw table, then left joins so unmatched rows survive with nulls
    let merged = compute_ratios(financials)
        .join(
            adoption,
            [col(FIRM_ID), col(QUARTER)],
            [col(FIRM_ID), col(QUARTER)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            macro_series,
            [col(QUARTER)],
            [col(QUARTER)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    debug!(rows = merged.height(), "merged financial, adoption and macro tables");

    let (indexed, index) = add_quarter_index(merged)?;
    debug!(min_year = index.min_year(), "indexed quarters");

    let lagged = indexed
        .lazy()
        .sort([FIRM_ID, Q_INDEX], SortMultipleOptions::default())
        .with_column(
            col(IT_INDEX)
                .shift(lit(1))
                .over([col(FIRM_ID)])
                .alias(IT_LAG1),
        );
    let winsorized = winsorize(lagged, RATIO_COLUMNS, config.winsorize)?.collect()?;
    debug!(
        lower = config.winsorize.lower,
        upper = config.winsorize.upper,
        "winsorized ratio columns"
    );

    let treated = assign_treatment(
        winsorized,
        config.treatment_rule,
        &TreatmentInputs {
            shock_column: shock,
            threshold: config.threshold,
            custom_events: inputs.custom_events.as_ref(),
            index,
        },
    )?;
    let timed = add_event_time(treated, config.never_treated)?;
    debug!(rule = %config.treatment_rule, "assigned treatment and event time");

    let instrumented = build_instrument(
        timed,
        config.instrument,
        &InstrumentInputs {
            lag: config.iv_lag,
            industry_waves: inputs.industry_waves.as_ref(),
        },
    )?;
    debug!(spec = %config.instrument, "built instrument");

    let rows_assembled = instrumented.height();
    let frame = instrumented
        .lazy()
        .filter(
            col(CCC)
                .is_not_null()
                .and(col(IT_LAG1).is_not_null())
                .and(col(shock).is_not_null()),
        )
        .sort([FIRM_ID, Q_INDEX], SortMultipleOptions::default())
        .select(output_columns(shock, config.instrument))
        .collect()?;

    let panel = Panel {
        frame,
        rows_assembled,
        instrument: config.instrument,
    };
    info!(
        rows = panel.height(),
        dropped = panel.rows_dropped(),
        rule = %config.treatment_rule,
        instrument = panel.instrument_column(),
        "assembled panel"
    );

    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;

    #[test]
    fn test_default_config() {
        let config = PanelConfig::default();
        assert_eq!(config.treatment_rule, TreatmentRule::GscpiThreshold);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.shock_column, "shock_value");
        assert_eq!(config.instrument, InstrumentSpec::PeerItLag);
        assert_eq!(config.iv_lag, 4);
        assert_eq!(config.winsorize, WinsorBounds::default());
        assert_eq!(config.never_treated, NeverTreatedPolicy::Zero);
    }

    #[test]
    fn test_output_columns_count() {
        assert_eq!(output_columns("gscpi", InstrumentSpec::IndustryWave).len(), 19);
    }

    #[test]
    fn test_missing_input_columns_fail_fast() {
        let empty = DataFrame::new(vec![Series::new(FIRM_ID.into(), ["a"]).into()]).unwrap();
        let inputs = PanelInputs::new(empty.clone(), empty.clone(), empty);

        assert!(matches!(
            assemble_panel(&inputs, &PanelConfig::default()),
            Err(PanelError::MissingColumns { table, .. }) if table == "financials"
        ));
    }

    #[test]
    fn test_invalid_bounds_fail_before_any_work() {
        let empty = DataFrame::empty();
        let inputs = PanelInputs::new(empty.clone(), empty.clone(), empty);
        let config = PanelConfig {
            winsorize: WinsorBounds {
                lower: 0.9,
                upper: 0.1,
            },
            ..PanelConfig::default()
        };

        assert!(matches!(
            assemble_panel(&inputs, &config),
            Err(PanelError::InvalidWinsorBounds { .. })
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PanelConfig = serde_json::from_str(
            r#"{"treatment_rule": "custom_dates", "instrument": "industry_wave", "iv_lag": 2}"#,
        )
        .unwrap();
        assert_eq!(config.treatment_rule, TreatmentRule::CustomDates);
        assert_eq!(config.instrument, InstrumentSpec::IndustryWave);
        assert_eq!(config.iv_lag, 2);
        assert_eq!(config.shock_column, "shock_value");
    }
}
