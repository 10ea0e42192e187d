//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::cache::CachedDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::auxiliary::AuxiliarySeries;
use crate::domain::backtest::{run_backtest, BacktestRecord};
use crate::domain::config_validation::{
    backtest_settings_from, data_settings_from, ensemble_config_from, validate_config,
    DataSettings,
};
use crate::domain::ensemble::{Composition, Ensemble, EnsembleConfig, EnsembleResult};
use crate::domain::error::VotecastError;
use crate::domain::metrics::BacktestSummary;
use crate::domain::series::{latest_evaluation_date, next_day_return, slice_to_date, PriceSeries};
use crate::ports::data_port::DataPort;

/// Number of trailing backtest records printed after the summary.
const RECENT_RECORDS: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "votecast", about = "Ten-model voting ensemble for daily market direction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the ensemble at the latest date or as of a past date
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// As-of date (YYYY-MM-DD); defaults to the latest trading day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Replay the ensemble over a date range and score it
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show the date range of every configured series
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate { config, date } => run_evaluate(&config, date),
        Command::Backtest { config, start, end } => run_backtest_command(&config, start, end),
        Command::Info { config } => run_info(&config),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, VotecastError> {
    info!(path = %path.display(), "loading config");
    let config = FileConfigAdapter::from_file(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Primary and auxiliary series, fetched once per command.
pub struct LoadedData {
    pub primary: PriceSeries,
    pub auxiliary: AuxiliarySeries,
}

/// Fetch the primary series and, for the full composition, the volatility
/// index and sector series. Auxiliary failures are logged and skipped.
pub fn load_data(
    port: &dyn DataPort,
    settings: &DataSettings,
    composition: Composition,
) -> Result<LoadedData, VotecastError> {
    let primary = port.fetch_series(&settings.primary)?;
    info!(symbol = primary.symbol(), rows = primary.len(), "loaded primary series");

    let mut auxiliary = AuxiliarySeries::none();
    if composition == Composition::Basic {
        return Ok(LoadedData { primary, auxiliary });
    }
    if let Some(vix) = &settings.vix {
        match port.fetch_series(vix) {
            Ok(series) => auxiliary = auxiliary.with_vix(series),
            Err(e) => warn!(symbol = %vix, error = %e, "volatility index unavailable"),
        }
    }
    for (symbol, weight) in &settings.sectors {
        match port.fetch_series(symbol) {
            Ok(series) => auxiliary = auxiliary.with_sector(symbol.clone(), *weight, series),
            Err(e) => warn!(symbol = %symbol, error = %e, "sector series unavailable"),
        }
    }
    Ok(LoadedData { primary, auxiliary })
}

fn data_port(settings: &DataSettings) -> CachedDataPort<CsvAdapter> {
    CachedDataPort::new(CsvAdapter::new(settings.directory.clone()), settings.cache_ttl)
}

fn prepare(config_path: &PathBuf) -> Result<(EnsembleConfig, LoadedData, FileConfigAdapter), VotecastError> {
    let config = load_config(config_path)?;
    let settings = data_settings_from(&config)?;
    let ensemble_config = ensemble_config_from(&config)?;
    let port = data_port(&settings);
    let data = load_data(&port, &settings, ensemble_config.composition)?;
    Ok((ensemble_config, data, config))
}

fn run_evaluate(config_path: &PathBuf, date: Option<NaiveDate>) -> Result<(), VotecastError> {
    let (ensemble_config, data, _) = prepare(config_path)?;
    let ensemble = Ensemble::from_config(&ensemble_config);

    let as_of = match date.or_else(|| latest_evaluation_date(&data.primary)) {
        Some(d) => d,
        None => {
            return Err(VotecastError::NoData {
                symbol: data.primary.symbol().to_string(),
            });
        }
    };
    let window = slice_to_date(&data.primary, as_of);
    if window.is_empty() {
        warn!(symbol = data.primary.symbol(), %as_of, "no rows on or before the requested date");
    }

    let result = ensemble.evaluate(&window, &data.auxiliary);
    println!(
        "{} as of {} ({} rows)",
        data.primary.symbol(),
        result.date.map_or_else(|| as_of.to_string(), |d| d.to_string()),
        window.len()
    );
    print_breakdown(&result, ensemble.len());

    if let Some(next) = next_day_return(&data.primary, as_of) {
        println!("Next trading day {}: {:+.2}%", next.date, next.return_pct);
    }
    Ok(())
}

fn run_backtest_command(
    config_path: &PathBuf,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), VotecastError> {
    let (ensemble_config, data, config) = prepare(config_path)?;
    let settings = backtest_settings_from(&config)?;

    let start_date = start.or(settings.start_date).ok_or_else(|| VotecastError::ConfigMissing {
        section: "backtest".to_string(),
        key: "start_date".to_string(),
    })?;
    let end_date = match end.or(settings.end_date).or_else(|| data.primary.last_date()) {
        Some(d) => d,
        None => {
            return Err(VotecastError::NoData {
                symbol: data.primary.symbol().to_string(),
            });
        }
    };

    let ensemble = Ensemble::from_config(&ensemble_config);
    let records = run_backtest(
        &data.primary,
        start_date,
        end_date,
        &data.auxiliary,
        &ensemble,
        settings.parallel,
    )?;
    let summary = BacktestSummary::compute(&records, &ensemble.model_ids());

    print_summary(&summary);
    print_recent(&records);
    Ok(())
}

fn run_info(config_path: &PathBuf) -> Result<(), VotecastError> {
    let config = load_config(config_path)?;
    let settings = data_settings_from(&config)?;
    let port = data_port(&settings);

    let mut symbols = vec![settings.primary.clone()];
    symbols.extend(settings.vix.iter().cloned());
    symbols.extend(settings.sectors.iter().map(|(s, _)| s.clone()));

    for symbol in &symbols {
        match port.fetch_series(symbol) {
            Ok(series) => match (series.first_date(), series.last_date()) {
                (Some(first), Some(last)) => {
                    let tz = series
                        .timezone()
                        .map_or_else(|| "naive".to_string(), |tz| tz.to_string());
                    println!(
                        "{}: {} rows, {} to {} ({})",
                        symbol,
                        series.len(),
                        first,
                        last,
                        tz
                    );
                }
                _ => println!("{}: no rows", symbol),
            },
            Err(e) => eprintln!("{}: {}", symbol, e),
        }
    }

    match port.list_symbols() {
        Ok(available) => println!("Available in {}: {}", settings.directory.display(), available.join(", ")),
        Err(e) => warn!(error = %e, "could not list data directory"),
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), VotecastError> {
    let config = load_config(config_path)?;
    let settings = data_settings_from(&config)?;
    let ensemble_config = ensemble_config_from(&config)?;
    let ensemble = Ensemble::from_config(&ensemble_config);
    let bp = ensemble.breakpoints();

    println!("Primary: {}", settings.primary);
    if let Some(vix) = &settings.vix {
        println!("Volatility index: {}", vix);
    }
    for (symbol, weight) in &settings.sectors {
        println!("Sector: {} (weight {:.2})", symbol, weight);
    }
    println!(
        "Models: {}",
        ensemble
            .model_ids()
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Breakpoints: buy {} / strong {}", bp.buy(), bp.strong());
    println!("Configuration is valid.");
    Ok(())
}

fn print_breakdown(result: &EnsembleResult, total_models: usize) {
    println!();
    println!("{:<20} {:>5}  {:<28} {}", "Model", "Vote", "Signal", "Explanation");
    for v in &result.breakdown {
        println!(
            "{:<20} {:>+5}  {:<28} {}",
            v.model.name(),
            v.vote,
            v.signal,
            v.explanation
        );
    }
    println!();
    println!(
        "Net vote: {:+}  Active models: {}/{}",
        result.net_vote, result.active_models, total_models
    );
    println!("Recommendation: {}", result.recommendation);
}

fn print_summary(summary: &BacktestSummary) {
    println!("Backtest summary");
    println!("  Predictions: {}", summary.total);
    println!("  Correct:     {}", summary.correct);
    println!("  Incorrect:   {}", summary.incorrect);
    println!("  Accuracy:    {:.1}%", summary.accuracy);
    println!();
    println!("{:<20} {:>11} {:>8} {:>9}", "Model", "Predictions", "Correct", "Accuracy");
    for m in &summary.per_model {
        let accuracy = m
            .accuracy
            .map_or_else(|| "-".to_string(), |a| format!("{:.1}%", a));
        println!(
            "{:<20} {:>11} {:>8} {:>9}",
            m.model.name(),
            m.predictions,
            m.correct,
            accuracy
        );
    }
}

fn print_recent(records: &[BacktestRecord]) {
    let skip = records.len().saturating_sub(RECENT_RECORDS);
    println!();
    println!("{:<10}  {:>4}  {:<16} {:>8}  {}", "Date", "Net", "Recommendation", "Next", "Hit");
    for r in &records[skip..] {
        println!(
            "{:<10}  {:>+4}  {:<16} {:>+7.2}%  {}",
            r.date,
            r.net_vote(),
            r.result.recommendation.to_string(),
            r.next.return_pct,
            if r.correct { "yes" } else { "no" }
        );
    }
}
