//! Pipeline configuration file.
//!
//! A JSON document with a `paths` section plus `treat`, `iv`, `winsorize`
//! and `run` sections. Every section except `paths` may be omitted.
//!
//! ```json
//! {
//!   "paths": {
//!     "fin_csv": "data/raw/fin.csv",
//!     "macro_csv": "data/raw/macro.csv",
//!     "it_csv": "data/interim/it_index.csv",
//!     "out_csv": "data/processed/firm_quarter.csv"
//!   },
//!   "treat": { "rule": "gscpi_thresh", "threshold": 0.5, "shock_col": "gscpi" },
//!   "iv": { "spec": "peer_it_lagK", "lag": 4 }
//! }
//! ```

use crate::error::{PipelineError, Result};
use cashcycle_panel::columns::SHOCK_VALUE;
use cashcycle_panel::instrument::DEFAULT_IV_LAG;
use cashcycle_panel::treatment::DEFAULT_THRESHOLD;
use cashcycle_panel::{
    InstrumentSpec, NeverTreatedPolicy, PanelConfig, PanelError, TreatmentRule, WinsorBounds,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Input and output file locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Financial line items
    pub fin_csv: PathBuf,
    /// Macro shock series
    pub macro_csv: PathBuf,
    /// IT-adoption scores
    pub it_csv: PathBuf,
    /// Where the panel is written
    pub out_csv: PathBuf,
    /// Custom events, required by `custom_dates`
    #[serde(default)]
    pub custom_events_csv: Option<PathBuf>,
    /// Industry waves, required by `industry_wave`
    #[serde(default)]
    pub industry_waves_csv: Option<PathBuf>,
    /// Where the JSON run summary is written
    #[serde(default)]
    pub summary_json: Option<PathBuf>,
}

/// Treatment section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatConfig {
    /// Treatment rule
    pub rule: TreatmentRule,
    /// Shock threshold for `gscpi_thresh`
    pub threshold: f64,
    /// Shock column in the macro file
    pub shock_col: String,
    /// Event time of never-treated firms
    pub never_treated: NeverTreatedPolicy,
}

impl Default for TreatConfig {
    fn default() -> Self {
        Self {
            rule: TreatmentRule::default(),
            threshold: DEFAULT_THRESHOLD,
            shock_col: SHOCK_VALUE.to_string(),
            never_treated: NeverTreatedPolicy::default(),
        }
    }
}

/// Instrument section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvConfig {
    /// Instrument spec
    pub spec: InstrumentSpec,
    /// Lag depth for `peer_it_lagK`
    pub lag: usize,
}

impl Default for IvConfig {
    fn default() -> Self {
        Self {
            spec: InstrumentSpec::default(),
            lag: DEFAULT_IV_LAG,
        }
    }
}

/// Run switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Validate the financial and macro files before building
    pub validate: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { validate: true }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// File locations
    pub paths: PathsConfig,
    /// Treatment settings
    #[serde(default)]
    pub treat: TreatConfig,
    /// Instrument settings
    #[serde(default)]
    pub iv: IvConfig,
    /// Winsorization bounds for the ratio columns
    #[serde(default)]
    pub winsorize: WinsorBounds,
    /// Run switches
    #[serde(default)]
    pub run: RunConfig,
}

impl PipelineConfig {
    /// Default settings for the given input and output files.
    pub fn new(fin_csv: PathBuf, macro_csv: PathBuf, it_csv: PathBuf, out_csv: PathBuf) -> Self {
        Self {
            paths: PathsConfig {
                fin_csv,
                macro_csv,
                it_csv,
                out_csv,
                custom_events_csv: None,
                industry_waves_csv: None,
                summary_json: None,
            },
            treat: TreatConfig::default(),
            iv: IvConfig::default(),
            winsorize: WinsorBounds::default(),
            run: RunConfig::default(),
        }
    }

    /// Read and check a JSON config file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or when
    /// [`PipelineConfig::check`] rejects it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PipelineError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| PipelineError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;
        config.check()?;
        Ok(config)
    }

    /// Reject configurations whose rule or spec lacks its input file, or
    /// whose bounds are invalid.
    ///
    /// Failures are the same [`PanelError`] variants the assembler raises.
    pub fn check(&self) -> Result<()> {
        if self.treat.rule == TreatmentRule::CustomDates && self.paths.custom_events_csv.is_none()
        {
            return Err(PanelError::MissingCustomEvents.into());
        }
        if self.iv.spec == InstrumentSpec::IndustryWave && self.paths.industry_waves_csv.is_none()
        {
            return Err(PanelError::MissingWaveTable.into());
        }
        self.winsorize.validate()?;
        Ok(())
    }

    /// The engine configuration these settings describe.
    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            treatment_rule: self.treat.rule,
            threshold: self.treat.threshold,
            shock_column: self.treat.shock_col.clone(),
            instrument: self.iv.spec,
            iv_lag: self.iv.lag,
            winsorize: self.winsorize,
            never_treated: self.treat.never_treated,
        }
    }
}
