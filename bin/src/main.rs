//! CLI for the fd-capm analytics pipeline.
//!
//! This binary loads price series from a JSON file, runs the CAPM pipeline and
//! prints the aligned data, beta/alpha estimates and expected returns.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use fd_capm::{
    AlignPolicy, CapmConfig, CapmError, CapmPipeline, CapmReport, InstrumentId, PriceSeries,
    StaticPriceProvider,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fd-capm")]
#[command(about = "CAPM beta and expected-return analytics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the instruments available in a price file
    List {
        /// JSON price file
        #[arg(long)]
        prices: PathBuf,
    },
    /// Print the default configuration as JSON
    Config,
    /// Estimate beta, alpha and expected return for a set of instruments
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// JSON price file
    #[arg(long)]
    prices: PathBuf,
    /// JSON configuration file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Instruments to analyze (defaults to every non-benchmark series)
    #[arg(long, value_delimiter = ',')]
    stocks: Vec<String>,
    /// Benchmark instrument
    #[arg(long)]
    benchmark: Option<String>,
    /// Years of history ending at `--end`
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    years: Option<u32>,
    /// Annual risk-free rate, in percent
    #[arg(long)]
    risk_free: Option<f64>,
    /// Alignment policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Last date of the analysis window (defaults to the latest price)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Rows shown in the head/tail previews
    #[arg(long, default_value_t = 5)]
    rows: usize,
    /// Emit the full report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    InnerJoin,
    ForwardFill,
}

impl From<PolicyArg> for AlignPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::InnerJoin => Self::InnerJoin,
            PolicyArg::ForwardFill => Self::ForwardFill,
        }
    }
}

/// Contents of a price file.
#[derive(Debug, Deserialize)]
struct PriceFile {
    series: Vec<PriceSeries>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("price file is empty")]
    NoPrices,
    #[error(transparent)]
    Capm(#[from] CapmError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::List { prices } => list_instruments(&prices),
        Commands::Config => print_default_config(),
        Commands::Analyze(args) => analyze(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_provider(path: &Path) -> Result<StaticPriceProvider, CliError> {
    let file: PriceFile = read_json(path)?;
    tracing::debug!(series = file.series.len(), path = %path.display(), "loaded price file");
    Ok(file.series.into_iter().collect())
}

/// List stored instruments with their date coverage.
fn list_instruments(path: &Path) -> Result<(), CliError> {
    let file: PriceFile = read_json(path)?;

    println!("Available instruments ({} total)\n", file.series.len());
    let mut series = file.series;
    series.sort_by(|a, b| a.instrument().cmp(b.instrument()));
    for s in &series {
        match s.date_range() {
            Some((start, end)) => {
                println!("  {} - {} prices, {} to {}", s.instrument(), s.len(), start, end)
            }
            None => println!("  {} - no prices", s.instrument()),
        }
    }
    Ok(())
}

fn print_default_config() -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&CapmConfig::default()).map_err(|source| {
        CliError::Json {
            path: PathBuf::from("<default>"),
            source,
        }
    })?;
    println!("{json}");
    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(args: &AnalyzeArgs) -> Result<CapmConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => read_json(path)?,
        None => CapmConfig::default(),
    };

    if let Some(benchmark) = &args.benchmark {
        config.benchmark = InstrumentId::new(benchmark.as_str());
    }
    if let Some(years) = args.years {
        config.lookback_years = years;
    }
    if let Some(rf) = args.risk_free {
        config.risk_free_rate = rf;
    }
    if let Some(policy) = args.policy {
        config.align_policy = policy.into();
    }
    Ok(config)
}

fn analyze(args: &AnalyzeArgs) -> Result<(), CliError> {
    let config = resolve_config(args)?;
    let provider = load_provider(&args.prices)?;

    let stocks: Vec<InstrumentId> = if args.stocks.is_empty() {
        provider
            .instruments()
            .into_iter()
            .filter(|id| **id != config.benchmark)
            .cloned()
            .collect()
    } else {
        args.stocks.iter().map(|s| InstrumentId::new(s.as_str())).collect()
    };

    let end = match args.end.or_else(|| provider.last_date()) {
        Some(end) => end,
        None => return Err(CliError::NoPrices),
    };

    let pipeline = CapmPipeline::with_config(config);
    let report = pipeline.run_with_provider(&provider, &stocks, end)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|source| CliError::Json {
            path: args.prices.clone(),
            source,
        })?;
        println!("{json}");
    } else {
        print_report(&report, args.rows)?;
    }
    Ok(())
}

fn print_report(report: &CapmReport, rows: usize) -> Result<(), CapmError> {
    println!("Prices (head)\n{}", report.prices.head(rows)?);
    println!("Prices (tail)\n{}", report.prices.tail(rows)?);
    println!("Normalized prices (tail)\n{}", report.normalized.tail(rows)?);
    println!("Daily returns (%) (tail)\n{}", report.returns.tail(rows)?);

    println!(
        "Market return: {:.2}% (risk-free {:.2}%)",
        report.market_return, report.risk_free_rate
    );
    println!("{}", report.summary_frame()?);
    for risk in &report.instruments {
        println!("  {}, expected return {}%", risk.estimate, risk.expected_return);
    }
    Ok(())
}
