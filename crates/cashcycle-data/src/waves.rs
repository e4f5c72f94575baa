//! Industry adoption waves derived from IT scores.
//!
//! For each (industry, quarter) the median `it_index` is compared against a
//! per-industry percentile of those medians; the wave switches to 1 in the
//! quarters at or above it. The result feeds the `industry_wave` instrument.

use crate::error::{DataError, Result};
use cashcycle_panel::PanelError;
use cashcycle_panel::columns::{
    FIRM_ID, INDUSTRY, IT_INDEX, QUARTER, WAVE, has_industry, require_columns,
};
use polars::prelude::*;
use tracing::info;

/// Default percentile of the industry-quarter medians.
pub const DEFAULT_WAVE_PERCENTILE: f64 = 0.6;

const MEDIAN_IT: &str = "median_it";
const WAVE_THRESHOLD: &str = "wave_threshold";

/// Derive the (industry, quarter, wave) table, sorted by industry then quarter.
///
/// Industry codes come from `adoption` itself when it carries a populated
/// industry column, otherwise from `industry_map` (firm_id → industry, first
/// row per firm). Rows without an industry are ignored.
///
/// # Errors
///
/// Fails on a percentile outside `[0, 1]`, missing adoption columns, or when
/// no industry code is available.
pub fn derive_industry_waves(
    adoption: &DataFrame,
    industry_map: Option<&DataFrame>,
    percentile: f64,
) -> Result<DataFrame> {
    if !(0.0..=1.0).contains(&percentile) {
        return Err(DataError::InvalidPercentile(percentile));
    }
    require_columns(adoption, "adoption", &[FIRM_ID, QUARTER, IT_INDEX])?;

    let text = |name: &str| col(name).cast(DataType::String);
    let score = col(IT_INDEX).cast(DataType::Float64);

    let scored = if has_industry(adoption) {
        adoption
            .clone()
            .lazy()
            .select([text(FIRM_ID), text(QUARTER), text(INDUSTRY), score])
    } else {
        let map = industry_map
            .filter(|m| has_industry(m))
            .ok_or_else(|| PanelError::MissingIndustry {
                operation: "industry_waves".to_string(),
            })?;
        require_columns(map, "industry_map", &[FIRM_ID, INDUSTRY])?;

        let firms = map
            .clone()
            .lazy()
            .select([text(FIRM_ID), text(INDUSTRY)])
            .group_by_stable([col(FIRM_ID)])
            .agg([col(INDUSTRY).first()]);
        adoption
            .clone()
            .lazy()
            .select([text(FIRM_ID), text(QUARTER), score])
            .join(
                firms,
                [col(FIRM_ID)],
                [col(FIRM_ID)],
                JoinArgs::new(JoinType::Left),
            )
    };

    let waves = scored
        .filter(col(INDUSTRY).is_not_null())
        .group_by([col(INDUSTRY), col(QUARTER)])
        .agg([col(IT_INDEX).median().alias(MEDIAN_IT)])
        .with_column(
            col(MEDIAN_IT)
                .quantile(lit(percentile), QuantileMethod::Linear)
                .over([col(INDUSTRY)])
                .alias(WAVE_THRESHOLD),
        )
        .with_column(
            when(col(MEDIAN_IT).gt_eq(col(WAVE_THRESHOLD)))
                .then(lit(1i64))
                .otherwise(lit(0i64))
                .cast(DataType::Int64)
                .alias(WAVE),
        )
        .sort([INDUSTRY, QUARTER], SortMultipleOptions::default())
        .select([col(INDUSTRY), col(QUARTER), col(WAVE)])
        .collect()?;

    info!(rows = waves.height(), percentile, "derived industry waves");
    Ok(waves)
}
