//! CrossLab CLI: SMA crossover vs buy-and-hold backtests.
//!
//! Commands:
//! - `run`: backtest one ticker from flags or a TOML config file
//! - `sweep`: run a grid of (short, long) window pairs over one ticker
//! - `download`: fetch prices from Yahoo Finance into the CSV cache

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crosslab_core::data::{download_tickers, CsvCache, PriceSource, YahooProvider};
use crosslab_runner::{
    export_sweep_csv, is_valid_ticker, load_prices, render_summary, render_sweep_table,
    run_single_backtest, run_sweep, save_artifacts, BacktestConfig, LoadOptions, ParamGrid,
};

#[derive(Parser)]
#[command(
    name = "crosslab",
    version,
    about = "CrossLab CLI: SMA crossover vs buy-and-hold backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one ticker and save the artifact bundle.
    Run {
        #[command(flatten)]
        backtest: BacktestArgs,

        /// Short SMA window (overrides the config file).
        #[arg(long)]
        short: Option<usize>,

        /// Long SMA window (overrides the config file).
        #[arg(long)]
        long: Option<usize>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Run every (short, long) pair over one ticker.
    Sweep {
        #[command(flatten)]
        backtest: BacktestArgs,

        /// Short windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [10, 20, 50])]
        short: Vec<usize>,

        /// Long windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = [100, 150, 200])]
        long: Vec<usize>,

        /// Run pairs one at a time instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Write results as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Download prices from Yahoo Finance into the CSV cache.
    Download {
        /// Tickers to download (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years before the end date.
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to today.
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

/// Options shared by `run` and `sweep`.
#[derive(Args)]
struct BacktestArgs {
    /// Path to a TOML config file with a [backtest] table.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol (required without --config).
    #[arg(long)]
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD). Defaults to 10 years before the end date.
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Initial portfolio value for both curves.
    #[arg(long)]
    capital: Option<f64>,

    /// Annualized risk-free rate for the Sharpe ratio, e.g. 0.02.
    #[arg(long)]
    risk_free: Option<f64>,

    /// Offline mode: no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Use synthetic data when no real data is available.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Re-download even if the cache covers the range.
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Cache directory.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,
}

impl BacktestArgs {
    /// Config file (if any) with command-line overrides applied, validated.
    fn to_config(&self, short: Option<usize>, long: Option<usize>) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => BacktestConfig::from_file(path)?,
            None => {
                let Some(ticker) = &self.ticker else {
                    bail!("one of --config or --ticker is required");
                };
                let (start, end) = default_range(self.start, self.end)?;
                BacktestConfig::new(ticker.trim().to_ascii_uppercase(), start, end)
            }
        };

        if let Some(ticker) = &self.ticker {
            config.ticker = ticker.trim().to_ascii_uppercase();
        }
        if let Some(start) = self.start {
            config.start_date = start;
        }
        if let Some(end) = self.end {
            config.end_date = end;
        }
        if let Some(short) = short {
            config.short_window = short;
        }
        if let Some(long) = long {
            config.long_window = long;
        }
        if let Some(capital) = self.capital {
            config.initial_capital = capital;
        }
        if let Some(rf) = self.risk_free {
            config.risk_free_rate = rf;
        }

        config.validate()?;
        Ok(config)
    }

    fn load_options(&self, config: &BacktestConfig) -> LoadOptions {
        LoadOptions {
            offline: self.offline,
            synthetic: self.synthetic,
            force: self.force,
            ..LoadOptions::new(config.start_date, config.end_date)
        }
    }

    /// The Yahoo provider unless running offline.
    fn provider(&self) -> Result<Option<YahooProvider>> {
        if self.offline {
            return Ok(None);
        }
        match YahooProvider::new() {
            Ok(p) => Ok(Some(p)),
            Err(e) if self.synthetic => {
                warn!(error = %e, "could not create HTTP client; continuing without network");
                Ok(None)
            }
            Err(e) => Err(e).context("failed to create Yahoo Finance client"),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

/// Fill a missing end with today and a missing start with ten years before the end.
fn default_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(NaiveDate, NaiveDate)> {
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = match start {
        Some(s) => s,
        None => end
            .with_year(end.year() - 10)
            .or_else(|| (end - chrono::Duration::days(1)).with_year(end.year() - 10))
            .context("could not compute default start date")?,
    };
    Ok((start, end))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            backtest,
            short,
            long,
            output_dir,
            no_save,
        } => run_backtest_cmd(&backtest, short, long, &output_dir, no_save),
        Commands::Sweep {
            backtest,
            short,
            long,
            sequential,
            csv,
        } => run_sweep_cmd(&backtest, short, long, !sequential, csv),
        Commands::Download {
            tickers,
            start,
            end,
            force,
            cache_dir,
        } => run_download(&tickers, start, end, force, cache_dir),
    }
}

fn run_backtest_cmd(
    args: &BacktestArgs,
    short: Option<usize>,
    long: Option<usize>,
    output_dir: &Path,
    no_save: bool,
) -> Result<()> {
    let config = args.to_config(short, long)?;
    let cache = CsvCache::new(&args.cache_dir);
    let provider = args.provider()?;
    let provider_ref = provider.as_ref().map(|p| p as &dyn PriceSource);

    let report = run_single_backtest(&config, &cache, provider_ref, &args.load_options(&config))
        .with_context(|| format!("backtest failed for {}", config.ticker))?;

    print!("{}", render_summary(&report));

    if !no_save {
        let run_dir = save_artifacts(&report, output_dir)?;
        println!("\nArtifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    args: &BacktestArgs,
    short: Vec<usize>,
    long: Vec<usize>,
    parallel: bool,
    csv_path: Option<PathBuf>,
) -> Result<()> {
    let grid = ParamGrid::new(short, long);
    if grid.size() == 0 {
        bail!("no valid (short, long) pairs: every short window must be less than some long window");
    }

    // The grid supplies the windows; the base config supplies everything else.
    let base = args.to_config(None, None)?;
    let cache = CsvCache::new(&args.cache_dir);
    let provider = args.provider()?;
    let provider_ref = provider.as_ref().map(|p| p as &dyn PriceSource);

    let loaded = load_prices(&base.ticker, &cache, provider_ref, &args.load_options(&base))
        .with_context(|| format!("failed to load prices for {}", base.ticker))?;
    if loaded.is_synthetic() {
        warn!(ticker = %base.ticker, "sweeping over synthetic data");
    }

    let results = run_sweep(&base, &loaded.series, &grid, parallel)?;
    print!("{}", render_sweep_table(&results));

    if let Some(path) = csv_path {
        let csv = export_sweep_csv(&results)?;
        std::fs::write(&path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = results.len(), "wrote sweep CSV");
    }
    Ok(())
}

/// Trim and uppercase each ticker, refusing any that is not path safe.
fn normalize_tickers(tickers: &[String]) -> Result<Vec<String>> {
    tickers
        .iter()
        .map(|t| {
            let ticker = t.trim().to_ascii_uppercase();
            if !is_valid_ticker(&ticker) {
                bail!("invalid ticker '{t}'");
            }
            Ok(ticker)
        })
        .collect()
}

fn run_download(
    tickers: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let (start, end) = default_range(start, end)?;
    if start >= end {
        bail!("start date ({start}) must be before end date ({end})");
    }

    let tickers = normalize_tickers(tickers)?;

    let provider = YahooProvider::new().context("failed to create Yahoo Finance client")?;
    let cache = CsvCache::new(cache_dir);
    let refs: Vec<&str> = tickers.iter().map(|s| s.as_str()).collect();

    let summary = download_tickers(&provider, &cache, &refs, start, end, force);
    println!(
        "Downloaded {} of {} ticker(s), {} already cached",
        summary.succeeded, summary.total, summary.skipped
    );

    if !summary.all_succeeded() {
        for (ticker, err) in &summary.errors {
            eprintln!("Error for {ticker}: {err}");
        }
        bail!("{} ticker(s) failed to download", summary.errors.len());
    }
    Ok(())
}
