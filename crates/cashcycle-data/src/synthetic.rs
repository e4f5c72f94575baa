//! Synthetic Raw Dataset
//!
//! A seeded toy dataset with the shape of the real inputs: firms spread over
//! four two-digit industry codes, five years of quarters, a shock series that
//! rises linearly from -0.4 to 1.1, staggered industry adoption waves, and IT
//! scores that drift upward for adopting firms once their industry's wave
//! starts. The same seed always produces the same files.

use crate::error::Result;
use crate::frames::{adoption_frame, financial_frame, macro_frame, wave_frame};
use crate::records::{AdoptionRecord, FinancialRecord, MacroRecord, WaveRecord};
use cashcycle_panel::columns::SHOCK_VALUE;
use cashcycle_panel::{PanelInputs, Quarter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Industry codes assigned to synthetic firms.
pub const INDUSTRIES: [&str; 4] = ["31", "32", "33", "34"];

const SHOCK_START: f64 = -0.4;
const SHOCK_END: f64 = 1.1;

/// Generator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticConfig {
    /// Number of firms (default: 40)
    pub firms: usize,
    /// RNG seed (default: 7)
    pub seed: u64,
    /// First year, inclusive (default: 2018)
    pub start_year: i32,
    /// Last year, inclusive (default: 2022)
    pub end_year: i32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            firms: 40,
            seed: 7,
            start_year: 2018,
            end_year: 2022,
        }
    }
}

/// Generated raw tables.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    /// Financial line items, sorted by firm then quarter
    pub financials: Vec<FinancialRecord>,
    /// Shock series, one row per quarter
    pub macro_series: Vec<MacroRecord>,
    /// IT scores, one row per firm-quarter
    pub adoption: Vec<AdoptionRecord>,
    /// Industry adoption waves
    pub waves: Vec<WaveRecord>,
}

/// Paths written by [`SyntheticDataset::write_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticFiles {
    /// `fin.csv`
    pub financials: PathBuf,
    /// `macro.csv`
    pub macro_series: PathBuf,
    /// `it_index.csv`
    pub adoption: PathBuf,
    /// `industry_waves.csv`
    pub waves: PathBuf,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Evenly spaced values from `start` to `end`, both included.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Generate the dataset.
///
/// # Errors
///
/// Fails when the year range produces an invalid quarter.
pub fn generate(config: &SyntheticConfig) -> Result<SyntheticDataset> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let first = Quarter::new(config.start_year, 1)?;
    let span = (i64::from(config.end_year) - i64::from(config.start_year) + 1).max(0) * 4;
    let quarters = (0..span)
        .map(|n| first.offset(n).map(|q| q.to_string()))
        .collect::<cashcycle_panel::Result<Vec<String>>>()?;

    // Industry i adopts from quarter position (i + 2) * 2 on
    let wave_start = |industry: usize| (industry + 2) * 2;

    let mut financials = Vec::with_capacity(config.firms * quarters.len());
    let mut adoption = Vec::with_capacity(config.firms * quarters.len());

    for n in 1..=config.firms {
        let firm_id = format!("firm{n:03}");
        let base_sales = rng.gen_range(8.0e7..2.2e8);
        let industry = rng.gen_range(0..INDUSTRIES.len());
        let adopter = rng.gen_bool(0.6);
        let it_level = rng.gen_range(-0.8..0.2);

        for (idx, quarter) in quarters.iter().enumerate() {
            let sales = base_sales * rng.gen_range(0.9..1.1);
            let cogs = sales * rng.gen_range(0.62..0.82);
            let inventory = rng.gen_range(8.0e6..3.5e7);
            let receivables = sales * rng.gen_range(0.10..0.20);
            let payables = cogs * rng.gen_range(0.07..0.16);

            financials.push(FinancialRecord {
                firm_id: firm_id.clone(),
                quarter: quarter.clone(),
                industry: Some(INDUSTRIES[industry].to_string()),
                sales: round_to(sales, 2),
                cogs: round_to(cogs, 2),
                inventory: round_to(inventory, 2),
                receivables: round_to(receivables, 2),
                payables: round_to(payables, 2),
            });

            let adopted_quarters = idx.saturating_sub(wave_start(industry));
            let drift = if adopter && idx >= wave_start(industry) {
                0.8 + 0.05 * adopted_quarters as f64
            } else {
                0.0
            };
            adoption.push(AdoptionRecord {
                firm_id: firm_id.clone(),
                quarter: quarter.clone(),
                it_index: round_to(it_level + drift + rng.gen_range(-0.25..0.25), 4),
            });
        }
    }

    let macro_series = quarters
        .iter()
        .zip(linspace(SHOCK_START, SHOCK_END, quarters.len()))
        .map(|(quarter, shock)| MacroRecord {
            quarter: quarter.clone(),
            shock_value: shock,
        })
        .collect();

    let waves = INDUSTRIES
        .iter()
        .enumerate()
        .flat_map(|(i, industry)| {
            quarters.iter().enumerate().map(move |(idx, quarter)| WaveRecord {
                industry: (*industry).to_string(),
                quarter: quarter.clone(),
                wave: i64::from(idx >= wave_start(i)),
            })
        })
        .collect();

    Ok(SyntheticDataset {
        financials,
        macro_series,
        adoption,
        waves,
    })
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

impl SyntheticDataset {
    /// Write the four CSV files into `dir`, creating it if needed.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<SyntheticFiles> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let files = SyntheticFiles {
            financials: dir.join("fin.csv"),
            macro_series: dir.join("macro.csv"),
            adoption: dir.join("it_index.csv"),
            waves: dir.join("industry_waves.csv"),
        };
        write_records(&files.financials, &self.financials)?;
        write_records(&files.macro_series, &self.macro_series)?;
        write_records(&files.adoption, &self.adoption)?;
        write_records(&files.waves, &self.waves)?;

        info!(
            dir = %dir.display(),
            firms = self.firm_count(),
            rows = self.financials.len(),
            "wrote synthetic dataset"
        );
        Ok(files)
    }

    /// Distinct firms in the financial table.
    pub fn firm_count(&self) -> usize {
        let mut firms: Vec<&str> = self.financials.iter().map(|r| r.firm_id.as_str()).collect();
        firms.dedup();
        firms.len()
    }

    /// In-memory panel inputs, waves attached.
    pub fn inputs(&self) -> Result<PanelInputs> {
        let inputs = PanelInputs::new(
            financial_frame(&self.financials)?,
            macro_frame(&self.macro_series, SHOCK_VALUE)?,
            adoption_frame(&self.adoption)?,
        )
        .with_industry_waves(wave_frame(&self.waves)?);
        Ok(inputs)
    }
}
