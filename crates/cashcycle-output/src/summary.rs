//! Run summary of a panel build.
//!
//! Records what was built and under which rule and spec, so a panel file can
//! always be traced back to its configuration.

use crate::export::{ExportError, ExportFormat, Exporter};
use cashcycle_panel::columns::{FIRM_ID, QUARTER, TREAT};
use cashcycle_panel::{Panel, PanelConfig};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts and settings of one build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// When the summary was produced.
    pub generated_at: DateTime<Utc>,

    /// Rows in the emitted panel.
    pub rows: usize,

    /// Rows before the completeness filter.
    pub rows_assembled: usize,

    /// Rows dropped for missing CCC, IT_lag1 or shock value.
    pub rows_dropped: usize,

    /// Distinct firms in the panel.
    pub firms: usize,

    /// Rows with `treat = 1`.
    pub treated_rows: usize,

    /// Earliest quarter label in the panel.
    pub first_quarter: Option<String>,

    /// Latest quarter label in the panel.
    pub last_quarter: Option<String>,

    /// Treatment rule name.
    pub treatment_rule: String,

    /// Shock threshold (used by `gscpi_thresh`).
    pub threshold: f64,

    /// Instrument spec name.
    pub instrument: String,

    /// Instrument column name.
    pub instrument_column: String,

    /// Lower winsorization quantile.
    pub winsor_lower: f64,

    /// Upper winsorization quantile.
    pub winsor_upper: f64,

    /// Where the panel was written, if it was.
    pub output: Option<String>,
}

impl RunSummary {
    /// Summarize `panel` as built with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel lacks the firm, quarter or treat column.
    pub fn from_panel(panel: &Panel, config: &PanelConfig) -> Result<Self, ExportError> {
        let frame = panel.frame();

        let firms = frame.column(FIRM_ID)?.n_unique()?;
        let treated_rows = frame
            .column(TREAT)?
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .filter(|t| *t == Some(1))
            .count();

        // YYYYQ# labels sort chronologically as text
        let quarters = frame.column(QUARTER)?.cast(&DataType::String)?;
        let labels = quarters.str()?;
        let first_quarter = labels.into_iter().flatten().min().map(str::to_string);
        let last_quarter = labels.into_iter().flatten().max().map(str::to_string);

        Ok(Self {
            generated_at: Utc::now(),
            rows: panel.height(),
            rows_assembled: panel.rows_assembled(),
            rows_dropped: panel.rows_dropped(),
            firms,
            treated_rows,
            first_quarter,
            last_quarter,
            treatment_rule: config.treatment_rule.to_string(),
            threshold: config.threshold,
            instrument: config.instrument.to_string(),
            instrument_column: panel.instrument_column().to_string(),
            winsor_lower: config.winsorize.lower,
            winsor_upper: config.winsorize.upper,
            output: None,
        })
    }

    /// Record where the panel was written.
    pub fn with_output(mut self, path: impl Into<String>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Share of emitted rows that are treated.
    pub fn treated_share(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.treated_rows as f64 / self.rows as f64
        }
    }

    /// Convert the summary to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Panel Summary")?;
        writeln!(f, "=============")?;
        writeln!(
            f,
            "Rows: {} ({} assembled, {} dropped)",
            self.rows, self.rows_assembled, self.rows_dropped
        )?;
        writeln!(f, "Firms: {}", self.firms)?;
        if let (Some(first), Some(last)) = (&self.first_quarter, &self.last_quarter) {
            writeln!(f, "Quarters: {first} to {last}")?;
        }
        writeln!(
            f,
            "Treated rows: {} ({:.1}%)",
            self.treated_rows,
            self.treated_share() * 100.0
        )?;
        writeln!(
            f,
            "Treatment rule: {} (threshold {})",
            self.treatment_rule, self.threshold
        )?;
        writeln!(f, "Instrument: {} -> {}", self.instrument, self.instrument_column)?;
        write!(
            f,
            "Winsorization: [{}, {}]",
            self.winsor_lower, self.winsor_upper
        )?;
        if let Some(output) = &self.output {
            write!(f, "\nOutput: {output}")?;
        }
        Ok(())
    }
}

impl Exporter for RunSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.serialize(self)?;
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e).into()
                })
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => self.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashcycle_panel::{PanelInputs, TreatmentRule, assemble_panel};

    fn panel(config: &PanelConfig) -> Panel {
        let quarters = ["2020Q1", "2020Q2", "2020Q3", "2020Q4"];
        let n = 8;
        let firms: Vec<&str> = ["a"; 4].into_iter().chain(["b"; 4]).collect();
        let labels: Vec<&str> = quarters.iter().chain(quarters.iter()).copied().collect();

        let fin = DataFrame::new(vec![
            Series::new("firm_id".into(), firms.clone()).into(),
            Series::new("quarter".into(), labels.clone()).into(),
            Series::new("industry".into(), vec!["31"; n]).into(),
            Series::new("sales".into(), vec![100.0; n]).into(),
            Series::new("cogs".into(), vec![60.0; n]).into(),
            Series::new("inventory".into(), vec![10.0; n]).into(),
            Series::new("receivables".into(), vec![20.0; n]).into(),
            Series::new("payables".into(), vec![5.0; n]).into(),
        ])
        .unwrap();
        let mac = DataFrame::new(vec![
            Series::new("quarter".into(), quarters).into(),
            Series::new("shock_value".into(), [0.1, 0.3, 0.6, 0.9]).into(),
        ])
        .unwrap();
        let it = DataFrame::new(vec![
            Series::new("firm_id".into(), firms).into(),
            Series::new("quarter".into(), labels).into(),
            Series::new("it_index".into(), vec![0.5; n]).into(),
        ])
        .unwrap();

        assemble_panel(&PanelInputs::new(fin, mac, it), config).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let config = PanelConfig::default();
        let summary = RunSummary::from_panel(&panel(&config), &config).unwrap();

        assert_eq!(summary.rows, 6);
        assert_eq!(summary.rows_assembled, 8);
        assert_eq!(summary.rows_dropped, 2);
        assert_eq!(summary.firms, 2);
        assert_eq!(summary.treated_rows, 4);
        assert_eq!(summary.first_quarter.as_deref(), Some("2020Q2"));
        assert_eq!(summary.last_quarter.as_deref(), Some("2020Q4"));
        assert_eq!(summary.treatment_rule, "gscpi_thresh");
        assert_eq!(summary.instrument, "peer_it_lagK");
        assert_eq!(summary.instrument_column, "IV_peer_IT");
        assert!(summary.output.is_none());
    }

    #[test]
    fn test_summary_text() {
        let config = PanelConfig {
            threshold: 0.7,
            ..PanelConfig::default()
        };
        let summary = RunSummary::from_panel(&panel(&config), &config)
            .unwrap()
            .with_output("data/processed/firm_quarter.csv");
        let text = summary.to_string();

        assert!(text.starts_with("Panel Summary\n"));
        assert!(text.contains("Rows: 6 (8 assembled, 2 dropped)"));
        assert!(text.contains("Quarters: 2020Q2 to 2020Q4"));
        assert!(text.contains("Treated rows: 2 (33.3%)"));
        assert!(text.contains("Treatment rule: gscpi_thresh (threshold 0.7)"));
        assert!(text.ends_with("Output: data/processed/firm_quarter.csv"));
    }

    #[test]
    fn test_summary_json_round_trip() {
        let config = PanelConfig {
            treatment_rule: TreatmentRule::IndustryTopDecile,
            ..PanelConfig::default()
        };
        let summary = RunSummary::from_panel(&panel(&config), &config).unwrap();

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"treatment_rule\": \"industry_topdecile\""));
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_treated_share_of_empty_panel() {
        let config = PanelConfig::default();
        let mut summary = RunSummary::from_panel(&panel(&config), &config).unwrap();
        summary.rows = 0;
        summary.treated_rows = 0;
        assert_eq!(summary.treated_share(), 0.0);
    }
}
