//! Synthetic files → loader → validation → panel build.

use cashcycle_data::loader::{load_adoption, load_financials, load_industry_waves, load_macro};
use cashcycle_data::{
    DEFAULT_WAVE_PERCENTILE, SyntheticConfig, derive_industry_waves, generate, validate_inputs,
};
use cashcycle_panel::columns::{FIRM_ID, INDUSTRY, SHOCK_VALUE, TREAT, WAVE};
use cashcycle_panel::{InstrumentSpec, PanelConfig, PanelInputs, assemble_panel};
use polars::prelude::*;

fn small() -> SyntheticConfig {
    SyntheticConfig {
        firms: 8,
        ..SyntheticConfig::default()
    }
}

#[test]
fn test_written_files_load_and_validate() {
    let dir = tempfile::tempdir().unwrap();
    let data = generate(&small()).unwrap();
    let files = data.write_to(dir.path().join("raw")).unwrap();

    let fin = load_financials(&files.financials).unwrap();
    let mac = load_macro(&files.macro_series, SHOCK_VALUE).unwrap();
    let it = load_adoption(&files.adoption).unwrap();
    let summary = validate_inputs(&fin, &mac, Some(&it), SHOCK_VALUE).unwrap();

    assert_eq!(summary.financial_rows, 8 * 20);
    assert_eq!(summary.macro_rows, 20);
    assert_eq!(summary.adoption_rows, Some(8 * 20));
    assert_eq!(fin.column(INDUSTRY).unwrap().dtype(), &DataType::String);
    assert_eq!(fin.column(INDUSTRY).unwrap().null_count(), 0);

    let waves = load_industry_waves(&files.waves).unwrap();
    assert_eq!(waves.height(), 4 * 20);
}

#[test]
fn test_loaded_files_match_in_memory_build() {
    let dir = tempfile::tempdir().unwrap();
    let data = generate(&small()).unwrap();
    let files = data.write_to(dir.path()).unwrap();

    let loaded = PanelInputs::new(
        load_financials(&files.financials).unwrap(),
        load_macro(&files.macro_series, SHOCK_VALUE).unwrap(),
        load_adoption(&files.adoption).unwrap(),
    );
    let from_files = assemble_panel(&loaded, &PanelConfig::default()).unwrap();
    let in_memory = assemble_panel(&data.inputs().unwrap(), &PanelConfig::default()).unwrap();

    assert_eq!(from_files.height(), in_memory.height());
    // Every firm loses its first quarter to the adoption lag
    assert_eq!(from_files.height(), 8 * 19);
    assert_eq!(
        from_files.frame().column(TREAT).unwrap().i32().unwrap().sum(),
        in_memory.frame().column(TREAT).unwrap().i32().unwrap().sum(),
    );
}

#[test]
fn test_wave_instrument_from_synthetic_waves() {
    let data = generate(&small()).unwrap();
    let config = PanelConfig {
        instrument: InstrumentSpec::IndustryWave,
        ..PanelConfig::default()
    };
    let panel = assemble_panel(&data.inputs().unwrap(), &config).unwrap();

    // Every (industry, quarter) of the panel has a wave row
    let iv = panel.frame().column(InstrumentSpec::IndustryWave.column()).unwrap();
    assert_eq!(iv.null_count(), 0);
}

#[test]
fn test_derived_waves_cover_every_industry_quarter() {
    let data = generate(&small()).unwrap();
    let inputs = data.inputs().unwrap();

    let waves =
        derive_industry_waves(&inputs.adoption, Some(&inputs.financials), DEFAULT_WAVE_PERCENTILE)
            .unwrap();
    let industries = inputs
        .financials
        .column(INDUSTRY)
        .unwrap()
        .n_unique()
        .unwrap();

    assert_eq!(waves.height(), industries * 20);
    let wave = waves.column(WAVE).unwrap().i64().unwrap();
    assert!(wave.into_iter().all(|w| matches!(w, Some(0 | 1))));
    assert!(waves.column(FIRM_ID).is_err());
}
