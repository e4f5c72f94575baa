//! File-driven pipeline: load, validate, assemble, write.

use crate::config::PipelineConfig;
use crate::error::Result;
use cashcycle_data::loader::{
    load_adoption, load_custom_events, load_financials, load_industry_waves, load_macro,
};
use cashcycle_data::{ValidationSummary, validate_inputs};
use cashcycle_output::{Exporter, ExportFormat, RunSummary, write_panel_csv};
use cashcycle_panel::{Panel, PanelInputs, assemble_panel};
use tracing::info;

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Validation row counts, when validation ran
    pub validation: Option<ValidationSummary>,
    /// The assembled panel
    pub panel: Panel,
    /// Summary of the build, output path included
    pub summary: RunSummary,
}

/// Load every input file the configuration names.
///
/// # Errors
///
/// Fails on unreadable files or missing header columns.
pub fn load_inputs(config: &PipelineConfig) -> Result<PanelInputs> {
    let paths = &config.paths;

    let mut inputs = PanelInputs::new(
        load_financials(&paths.fin_csv)?,
        load_macro(&paths.macro_csv, &config.treat.shock_col)?,
        load_adoption(&paths.it_csv)?,
    );
    if let Some(path) = &paths.custom_events_csv {
        inputs = inputs.with_custom_events(load_custom_events(path)?);
    }
    if let Some(path) = &paths.industry_waves_csv {
        inputs = inputs.with_industry_waves(load_industry_waves(path)?);
    }
    Ok(inputs)
}

/// Run the pipeline end to end.
///
/// Validates the financial, macro and adoption tables (unless `run.validate` is off),
/// assembles the panel, writes it to `paths.out_csv`, and writes the JSON run
/// summary to `paths.summary_json` when set.
///
/// # Errors
///
/// Fails on the first load, validation, assembly or write error.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.check()?;
    let inputs = load_inputs(config)?;

    let validation = if config.run.validate {
        Some(validate_inputs(
            &inputs.financials,
            &inputs.macro_series,
            Some(&inputs.adoption),
            &config.treat.shock_col,
        )?)
    } else {
        None
    };

    let panel_config = config.panel_config();
    let panel = assemble_panel(&inputs, &panel_config)?;

    let out = &config.paths.out_csv;
    write_panel_csv(panel.frame(), out)?;
    let summary = RunSummary::from_panel(&panel, &panel_config)?
        .with_output(out.display().to_string());

    if let Some(path) = &config.paths.summary_json {
        summary.export_to_file(path, ExportFormat::PrettyJson)?;
        info!(path = %path.display(), "wrote run summary");
    }

    Ok(PipelineOutcome {
        validation,
        panel,
        summary,
    })
}
