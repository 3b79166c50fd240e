//! CLI definition and dispatch.
//!
//! Thin glue: resolves configuration, pulls prices from a CSV price source,
//! runs the engines and writes their tables. Logs go to stderr; tables go to
//! stdout unless an output location is given.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::csv_report;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    DataConfig, load_data_config, load_feature_window, load_indicator_params,
    load_requested_indicators,
};
use crate::domain::correlation::{EXTREME_PAIRS, compute_correlation};
use crate::domain::diagnostic::Diagnostic;
use crate::domain::error::MarketlensError;
use crate::domain::features::extract_features;
use crate::domain::indicator::compute_indicators_batch;
use crate::domain::metrics::{compute_metrics, compute_summary, growth_curves};
use crate::domain::returns::{compute_returns, portfolio_returns};
use crate::ports::price_source::PriceSource;

#[derive(Parser, Debug)]
#[command(name = "marketlens", about = "Technical indicators and portfolio statistics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where prices come from; flags override the `[data]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory of per-symbol CSV files
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Comma-separated symbols; defaults to every file in the data directory
    #[arg(short, long, value_delimiter = ',')]
    pub symbols: Vec<String>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub end: Option<NaiveDate>,
    #[arg(long)]
    pub interval: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute technical indicators per instrument
    Indicators {
        #[command(flatten)]
        data: DataArgs,
        /// Directory for `<SYMBOL>_indicators.csv` files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Returns, metrics, correlation and growth paths across instruments
    Portfolio {
        #[command(flatten)]
        data: DataArgs,
        /// Directory for the portfolio tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rolling feature table
    Features {
        #[command(flatten)]
        data: DataArgs,
        #[arg(short, long)]
        window: Option<usize>,
        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[command(flatten)]
        data: DataArgs,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Dispatches one subcommand.
pub fn execute(cli: Cli) -> Result<(), MarketlensError> {
    match cli.command {
        Command::Indicators { data, output } => run_indicators(&data, output.as_deref()),
        Command::Portfolio { data, output } => run_portfolio(&data, output.as_deref()),
        Command::Features {
            data,
            window,
            output,
        } => run_features(&data, window, output.as_deref()),
        Command::ListSymbols { data } => run_list_symbols(&data),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, MarketlensError> {
    match path {
        Some(p) => {
            info!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// `[data]` settings with command-line overrides applied.
pub fn resolve_data(args: &DataArgs, config: &FileConfigAdapter) -> Result<DataConfig, MarketlensError> {
    let mut data = load_data_config(config)?;
    if let Some(path) = &args.data {
        data.path = Some(path.display().to_string());
    }
    if !args.symbols.is_empty() {
        data.symbols = args.symbols.clone();
    }
    if args.start.is_some() {
        data.start_date = args.start;
    }
    if args.end.is_some() {
        data.end_date = args.end;
    }
    if let Some(interval) = &args.interval {
        data.interval = interval.clone();
    }
    if let (Some(start), Some(end)) = (data.start_date, data.end_date) {
        if start > end {
            return Err(MarketlensError::ConfigInvalid {
                section: "data".into(),
                key: "start_date".into(),
                reason: "start_date must not be after end_date".into(),
            });
        }
    }
    Ok(data)
}

struct Session {
    source: CsvPriceSource,
    symbols: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
    interval: String,
}

fn open_session(data: &DataConfig) -> Result<Session, MarketlensError> {
    let path = data.path.as_ref().ok_or_else(|| MarketlensError::ConfigMissing {
        section: "data".into(),
        key: "path".into(),
    })?;
    let source = CsvPriceSource::new(PathBuf::from(path));
    let symbols = if data.symbols.is_empty() {
        source.list_symbols()?
    } else {
        data.symbols.clone()
    };
    if symbols.is_empty() {
        return Err(MarketlensError::ConfigMissing {
            section: "data".into(),
            key: "symbols".into(),
        });
    }
    Ok(Session {
        source,
        symbols,
        start: data.start_date.unwrap_or(NaiveDate::MIN),
        end: data.end_date.unwrap_or(NaiveDate::MAX),
        interval: data.interval.clone(),
    })
}

fn report_diagnostics(context: &str, diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        warn!("{context}: {d}");
    }
}

/// File under `dir`, or stdout when no directory was given.
fn sink(dir: Option<&Path>, name: &str) -> Result<Box<dyn Write>, MarketlensError> {
    match dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(name);
            info!("Writing {}", path.display());
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn run_indicators(args: &DataArgs, output: Option<&Path>) -> Result<(), MarketlensError> {
    let config = load_config(args.config.as_deref())?;
    let params = load_indicator_params(&config)?;
    let requested = load_requested_indicators(&config)?;
    let session = open_session(&resolve_data(args, &config)?)?;

    let mut series = Vec::with_capacity(session.symbols.len());
    for symbol in &session.symbols {
        match session
            .source
            .fetch_series(symbol, session.start, session.end, &session.interval)
        {
            Ok(s) => series.push(s),
            Err(e) => warn!("skipping {symbol}: {e}"),
        }
    }
    if series.is_empty() {
        return Err(MarketlensError::EmptyInput {
            context: "requested symbols".into(),
        });
    }

    info!(
        "Computing {} indicator families for {} symbols",
        requested.len(),
        series.len()
    );
    let results = compute_indicators_batch(&series, &requested, &params);

    for (s, result) in series.iter().zip(results) {
        let outcome = match result {
            Ok(o) => o,
            Err(e) => {
                warn!("skipping {}: {e}", s.symbol());
                continue;
            }
        };
        report_diagnostics(s.symbol(), &outcome.diagnostics);
        let out = sink(output, &format!("{}_indicators.csv", s.symbol()))?;
        csv_report::write_indicator_set(out, &outcome.value)?;
    }
    Ok(())
}

fn run_portfolio(args: &DataArgs, output: Option<&Path>) -> Result<(), MarketlensError> {
    let config = load_config(args.config.as_deref())?;
    let session = open_session(&resolve_data(args, &config)?)?;

    let prices = session.source.fetch_matrix(
        &session.symbols,
        session.start,
        session.end,
        &session.interval,
    );
    report_diagnostics("prices", &prices.diagnostics);
    let prices = prices.value;
    info!(
        "Loaded {} rows for {} symbols",
        prices.row_count(),
        prices.symbols().len()
    );

    let returns = compute_returns(&prices)?;
    let portfolio = portfolio_returns(&returns);

    let mut metrics = vec![("portfolio".to_string(), compute_metrics(&portfolio)?)];
    for symbol in returns.symbols() {
        let Some(series) = returns.series(symbol).filter(|s| !s.is_empty()) else {
            warn!("{symbol}: no returns");
            continue;
        };
        metrics.push((symbol.clone(), compute_metrics(&series)?));
    }

    let summary = compute_summary(&prices, &returns);
    let correlation = compute_correlation(&returns);
    report_diagnostics("correlation", &correlation.diagnostics);
    let correlation = correlation.value;
    let growth = growth_curves(&prices, &portfolio);

    csv_report::write_returns(sink(output, "returns.csv")?, &returns)?;
    csv_report::write_summary(sink(output, "summary.csv")?, &summary)?;
    csv_report::write_metrics(sink(output, "metrics.csv")?, &metrics)?;
    csv_report::write_correlation(sink(output, "correlation.csv")?, &correlation)?;
    csv_report::write_pairs(
        sink(output, "most_negative.csv")?,
        &correlation.most_negative(EXTREME_PAIRS),
    )?;
    csv_report::write_pairs(
        sink(output, "most_positive.csv")?,
        &correlation.most_positive(EXTREME_PAIRS),
    )?;
    csv_report::write_growth(sink(output, "growth.csv")?, &growth)?;
    Ok(())
}

fn run_features(
    args: &DataArgs,
    window: Option<usize>,
    output: Option<&Path>,
) -> Result<(), MarketlensError> {
    let config = load_config(args.config.as_deref())?;
    let window = match window {
        Some(w) if w < 2 => {
            return Err(MarketlensError::ConfigInvalid {
                section: "features".into(),
                key: "window".into(),
                reason: "window must be at least 2".into(),
            });
        }
        Some(w) => w,
        None => load_feature_window(&config)?,
    };
    let session = open_session(&resolve_data(args, &config)?)?;

    let prices = session.source.fetch_matrix(
        &session.symbols,
        session.start,
        session.end,
        &session.interval,
    );
    report_diagnostics("prices", &prices.diagnostics);

    info!("Extracting features with a {window}-bar window");
    let features = extract_features(&prices.value, window)?;
    report_diagnostics("features", &features.diagnostics);

    let out: Box<dyn Write> = match output {
        Some(path) => {
            info!("Writing {}", path.display());
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(io::stdout().lock()),
    };
    csv_report::write_features(out, &features.value)
}

fn run_list_symbols(args: &DataArgs) -> Result<(), MarketlensError> {
    let config = load_config(args.config.as_deref())?;
    let data = resolve_data(args, &config)?;
    let path = data.path.ok_or_else(|| MarketlensError::ConfigMissing {
        section: "data".into(),
        key: "path".into(),
    })?;
    let symbols = CsvPriceSource::new(PathBuf::from(path)).list_symbols()?;
    let mut out = io::stdout().lock();
    for symbol in &symbols {
        writeln!(out, "{symbol}")?;
    }
    info!("{} symbols", symbols.len());
    Ok(())
}
