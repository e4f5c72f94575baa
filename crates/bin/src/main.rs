//! cashcycle CLI binary.
//!
//! Provides command-line interface for building firm-quarter panels.

use cashcycle::data::loader::{load_adoption, load_financials, load_macro};
use cashcycle::data::{
    DEFAULT_WAVE_PERCENTILE, DataError, SyntheticConfig, ValidationSummary, derive_industry_waves,
    generate, validate_inputs,
};
use cashcycle::output::{ExportFormat, Exporter};
use cashcycle::panel::columns::SHOCK_VALUE;
use cashcycle::panel::instrument::DEFAULT_IV_LAG;
use cashcycle::panel::treatment::DEFAULT_THRESHOLD;
use cashcycle::panel::{InstrumentSpec, NeverTreatedPolicy, TreatmentRule, WinsorBounds};
use cashcycle::{PipelineConfig, PipelineOutcome, run_pipeline};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cashcycle")]
#[command(about = "cashcycle: firm-quarter panels for IT adoption and cash-conversion-cycle studies", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the processed panel from raw files
    Build(BuildArgs),

    /// Check the input files against their schemas
    Validate {
        /// Financial line items CSV
        #[arg(long)]
        fin: PathBuf,

        /// Macro shock series CSV
        #[arg(long = "macro")]
        macro_csv: PathBuf,

        /// IT-adoption score CSV, checked too when given
        #[arg(long)]
        it: Option<PathBuf>,

        /// Shock column in the macro file
        #[arg(long, default_value = SHOCK_VALUE)]
        shock_col: String,
    },

    /// Derive industry adoption waves from IT scores
    Waves {
        /// IT score CSV (firm_id, quarter, it_index, optional industry)
        #[arg(long)]
        it: PathBuf,

        /// Financial CSV supplying industry codes when the score file has none
        #[arg(long)]
        fin: Option<PathBuf>,

        /// Output wave CSV
        #[arg(long)]
        out: PathBuf,

        /// Percentile of industry-quarter medians that switches the wave on
        #[arg(long, default_value_t = DEFAULT_WAVE_PERCENTILE)]
        percentile: f64,
    },

    /// Write a synthetic raw dataset
    Synth {
        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Number of firms
        #[arg(long, default_value_t = 40)]
        firms: usize,

        /// RNG seed
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },

    /// Validate and build from a JSON pipeline config
    Run {
        /// Pipeline config file
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Financial line items CSV
    #[arg(long)]
    fin: PathBuf,

    /// Macro shock series CSV
    #[arg(long = "macro")]
    macro_csv: PathBuf,

    /// IT-adoption score CSV
    #[arg(long)]
    it: PathBuf,

    /// Output panel CSV
    #[arg(long)]
    out: PathBuf,

    /// Treatment rule: gscpi_thresh, industry_topdecile or custom_dates
    #[arg(long, default_value = "gscpi_thresh")]
    treat_rule: TreatmentRule,

    /// Shock threshold for gscpi_thresh
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Shock column in the macro file
    #[arg(long, default_value = SHOCK_VALUE)]
    shock_col: String,

    /// Custom events CSV (firm_id, event_quarter) for custom_dates
    #[arg(long)]
    custom_events: Option<PathBuf>,

    /// Instrument spec: peer_it_lagK or industry_wave
    #[arg(long, default_value = "peer_it_lagK")]
    iv_spec: InstrumentSpec,

    /// Lag depth K for peer_it_lagK
    #[arg(long, default_value_t = DEFAULT_IV_LAG)]
    iv_lag: usize,

    /// Industry wave CSV (industry, quarter, wave) for industry_wave
    #[arg(long)]
    industry_waves: Option<PathBuf>,

    /// Lower winsorization quantile
    #[arg(long, default_value_t = 0.01)]
    winsor_lower: f64,

    /// Upper winsorization quantile
    #[arg(long, default_value_t = 0.99)]
    winsor_upper: f64,

    /// Event time of never-treated firms: zero or null
    #[arg(long, default_value = "zero")]
    never_treated: NeverTreatedPolicy,

    /// Write a JSON run summary here
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Validate the financial and macro files first
    #[arg(long)]
    validate: bool,
}

impl BuildArgs {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.fin, self.macro_csv, self.it, self.out);
        config.paths.custom_events_csv = self.custom_events;
        config.paths.industry_waves_csv = self.industry_waves;
        config.paths.summary_json = self.summary;
        config.treat.rule = self.treat_rule;
        config.treat.threshold = self.threshold;
        config.treat.shock_col = self.shock_col;
        config.treat.never_treated = self.never_treated;
        config.iv.spec = self.iv_spec;
        config.iv.lag = self.iv_lag;
        config.winsorize = WinsorBounds {
            lower: self.winsor_lower,
            upper: self.winsor_upper,
        };
        config.run.validate = self.validate;
        config
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Build(args) => {
            let config = args.into_config();
            let outcome = run_pipeline(&config)?;
            report(&config, &outcome);
        }
        Commands::Validate {
            fin,
            macro_csv,
            it,
            shock_col,
        } => {
            validate_files(fin, macro_csv, it, &shock_col)?;
        }
        Commands::Waves {
            it,
            fin,
            out,
            percentile,
        } => {
            write_waves(it, fin, out, percentile)?;
        }
        Commands::Synth { out, firms, seed } => {
            let config = SyntheticConfig {
                firms,
                seed,
                ..SyntheticConfig::default()
            };
            let files = generate(&config)?.write_to(&out)?;
            println!("Wrote synthetic raw data to {}", out.display());
            for path in [
                &files.financials,
                &files.macro_series,
                &files.adoption,
                &files.waves,
            ] {
                println!("  {}", path.display());
            }
        }
        Commands::Run { config } => {
            let config = PipelineConfig::from_file(&config)?;
            debug!(?config, "loaded pipeline config");
            let outcome = run_pipeline(&config)?;
            report(&config, &outcome);
        }
    }

    Ok(())
}

fn report(config: &PipelineConfig, outcome: &PipelineOutcome) {
    if let Some(validation) = &outcome.validation {
        println!("Validation OK: {}", row_counts(validation));
    }
    println!(
        "Processed rows: {} -> {}",
        outcome.summary.rows,
        config.paths.out_csv.display()
    );
    println!();
    println!("{}", outcome.summary);
}

fn row_counts(summary: &ValidationSummary) -> String {
    let mut counts = format!(
        "{} financial rows, {} macro rows",
        summary.financial_rows, summary.macro_rows
    );
    if let Some(rows) = summary.adoption_rows {
        counts.push_str(&format!(", {rows} adoption rows"));
    }
    counts
}

fn validate_files(
    fin: PathBuf,
    macro_csv: PathBuf,
    it: Option<PathBuf>,
    shock_col: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let financials = load_financials(&fin)?;
    let macro_series = load_macro(&macro_csv, shock_col)?;
    let adoption = it.map(|path| load_adoption(&path)).transpose()?;

    match validate_inputs(&financials, &macro_series, adoption.as_ref(), shock_col) {
        Ok(summary) => {
            println!("Validation OK: schemas look good. {}", row_counts(&summary));
            Ok(())
        }
        Err(DataError::Validation(issues)) => {
            for issue in &issues {
                println!("  {}", issue);
            }
            Err(format!("validation failed with {} problem(s)", issues.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_waves(
    it: PathBuf,
    fin: Option<PathBuf>,
    out: PathBuf,
    percentile: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let adoption = load_adoption(&it)?;
    let industry_map = fin.map(|path| load_financials(&path)).transpose()?;

    let waves = derive_industry_waves(&adoption, industry_map.as_ref(), percentile)?;
    waves.export_to_file(&out, ExportFormat::Csv)?;
    println!("[OK] Wrote {} rows -> {}", waves.height(), out.display());
    Ok(())
}
