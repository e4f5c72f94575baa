//! Instrument Builder
//!
//! Builds exactly one instrument column for the endogenous adoption regressor.
//!
//! - `peer_it_lagK` → `IV_peer_IT`: industry-quarter mean adoption minus own
//!   adoption, lagged `K` rows within the firm.
//! - `industry_wave` → `IV_wave`: an externally supplied wave indicator joined
//!   on (industry, quarter).

use crate::columns::{
    FIRM_ID, INDUSTRY, IT_INDEX, Q_INDEX, QUARTER, WAVE, has_industry, require_columns,
};
use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default lag depth `K` for [`InstrumentSpec::PeerItLag`].
pub const DEFAULT_IV_LAG: usize = 4;

/// Peer-adoption instrument column.
pub const IV_PEER_IT: &str = "IV_peer_IT";
/// Industry-wave instrument column.
pub const IV_WAVE: &str = "IV_wave";

const PEER_GAP: &str = "__peer_gap";

/// Which instrument to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InstrumentSpec {
    /// Lagged peer-mean-minus-self adoption
    #[default]
    #[serde(rename = "peer_it_lagK")]
    PeerItLag,
    /// Externally supplied industry adoption waves
    #[serde(rename = "industry_wave")]
    IndustryWave,
}

impl InstrumentSpec {
    /// Every spec, in declaration order.
    pub const ALL: [Self; 2] = [Self::PeerItLag, Self::IndustryWave];

    /// Configuration name of the spec.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PeerItLag => "peer_it_lagK",
            Self::IndustryWave => "industry_wave",
        }
    }

    /// Name of the column the spec produces.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::PeerItLag => IV_PEER_IT,
            Self::IndustryWave => IV_WAVE,
        }
    }
}

impl fmt::Display for InstrumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentSpec {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|spec| spec.name() == s)
            .ok_or_else(|| PanelError::UnknownInstrumentSpec(s.to_string()))
    }
}

/// Everything a spec may read besides the panel itself.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentInputs<'a> {
    /// Lag depth for [`InstrumentSpec::PeerItLag`]
    pub lag: usize,
    /// Wave table for [`InstrumentSpec::IndustryWave`]
    pub industry_waves: Option<&'a DataFrame>,
}

/// Add the instrument column for `spec`.
pub fn build_instrument(
    frame: DataFrame,
    spec: InstrumentSpec,
    inputs: &InstrumentInputs<'_>,
) -> Result<DataFrame> {
    match spec {
        InstrumentSpec::PeerItLag => peer_it_instrument(frame, inputs.lag),
        InstrumentSpec::IndustryWave => {
            let waves = inputs.industry_waves.ok_or(PanelError::MissingWaveTable)?;
            industry_wave_instrument(frame, waves)
        }
    }
}

/// `IV_peer_IT`: `(industry-quarter mean it_index) - own it_index`, taken from
/// `lag` rows earlier in the firm's chronological sequence.
///
/// Null when the firm has fewer than `lag` earlier rows, or when the source
/// row lacks an industry code or an adoption score.
pub fn peer_it_instrument(frame: DataFrame, lag: usize) -> Result<DataFrame> {
    require_columns(&frame, "panel", &[FIRM_ID, QUARTER, Q_INDEX, IT_INDEX])?;
    if !has_industry(&frame) {
        return Err(PanelError::MissingIndustry {
            operation: InstrumentSpec::PeerItLag.name().to_string(),
        });
    }

    let peer_gap = col(IT_INDEX).mean().over([col(INDUSTRY), col(QUARTER)]) - col(IT_INDEX);

    let result = frame
        .lazy()
        .sort([FIRM_ID, Q_INDEX], SortMultipleOptions::default())
        .with_column(
            when(col(INDUSTRY).is_not_null())
                .then(peer_gap)
                .otherwise(lit(NULL))
                .alias(PEER_GAP),
        )
        .with_column(
            col(PEER_GAP)
                .shift(lit(lag as i64))
                .over([col(FIRM_ID)])
                .alias(IV_PEER_IT),
        )
        .collect()?
        .drop(PEER_GAP)?;

    Ok(result)
}

/// `IV_wave`: the wave value for the row's (industry, quarter), null when the
/// pair is absent from `waves`. Duplicate pairs keep their first row.
pub fn industry_wave_instrument(frame: DataFrame, waves: &DataFrame) -> Result<DataFrame> {
    require_columns(waves, "industry_waves", &[INDUSTRY, QUARTER, WAVE])?;
    require_columns(&frame, "panel", &[INDUSTRY, QUARTER])?;

    let table = waves
        .clone()
        .lazy()
        .select([
            col(INDUSTRY).cast(DataType::String),
            col(QUARTER).cast(DataType::String),
            col(WAVE).cast(DataType::Float64),
        ])
        .group_by_stable([col(INDUSTRY), col(QUARTER)])
        .agg([col(WAVE).first().alias(IV_WAVE)]);

    let result = frame
        .lazy()
        .join(
            table,
            [col(INDUSTRY), col(QUARTER)],
            [col(INDUSTRY), col(QUARTER)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    Ok(result)
}
