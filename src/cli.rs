//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::binance_adapter::{request_from_config, BinanceAdapter, BinanceConfig};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export::CsvExporter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_crossover, CrossoverConfig};
use crate::domain::config_validation::{
    build_crossover_config, build_indicator_config, PeriodSetting,
};
use crate::domain::error::BarlyticsError;
use crate::domain::indicator_table::{apply_indicators, IndicatorConfig};
use crate::domain::metrics::Summary;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::TableSink;

#[derive(Parser, Debug)]
#[command(name = "barlytics", about = "OHLCV indicators and crossover backtests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where bars come from: a CSV file, a directory of `{SYMBOL}_{interval}.csv`
/// files, or the Binance klines endpoint. The interval, limit and time range
/// select from a symbol source only; `--input` is always read whole.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Bar CSV with at least `open_time` and `close` columns
    #[arg(short, long, conflicts_with = "symbol")]
    pub input: Option<PathBuf>,
    /// Trading pair, e.g. BTCUSDT
    #[arg(long, required_unless_present = "input")]
    pub symbol: Option<String>,
    /// Read `{SYMBOL}_{interval}.csv` from this directory instead of the API
    #[arg(long, requires = "symbol")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, requires = "symbol")]
    pub interval: Option<String>,
    /// Keep only the latest N bars
    #[arg(long, requires = "symbol")]
    pub limit: Option<u32>,
    /// Inclusive lower bound on open time, epoch milliseconds
    #[arg(long, requires = "symbol")]
    pub start_ms: Option<i64>,
    /// Inclusive upper bound on open time, epoch milliseconds
    #[arg(long, requires = "symbol")]
    pub end_ms: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download klines and write them as CSV
    Fetch {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        start_ms: Option<i64>,
        #[arg(long)]
        end_ms: Option<i64>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compute the indicator table and export it as CSV
    Indicators {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// SMA window, or `off`
        #[arg(long)]
        sma: Option<PeriodSetting>,
        /// EMA span, or `off`
        #[arg(long)]
        ema: Option<PeriodSetting>,
        /// RSI period, or `off`
        #[arg(long)]
        rsi: Option<PeriodSetting>,
        /// Volatility window, or `off`
        #[arg(long)]
        vol: Option<PeriodSetting>,
        #[arg(long)]
        no_macd: bool,
        #[arg(long)]
        no_bb: bool,
    },
    /// Run the EMA crossover backtest
    Backtest {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        fast: Option<usize>,
        #[arg(long)]
        slow: Option<usize>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the per-bar signal, equity and drawdown series here
        #[arg(long)]
        export: Option<PathBuf>,
        /// Write the result JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print summary statistics as JSON
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Indicator switches given on the command line; each overrides config.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorOverrides {
    pub sma: Option<PeriodSetting>,
    pub ema: Option<PeriodSetting>,
    pub rsi: Option<PeriodSetting>,
    pub vol: Option<PeriodSetting>,
    pub no_macd: bool,
    pub no_bb: bool,
}

impl IndicatorOverrides {
    pub fn apply(&self, mut config: IndicatorConfig) -> IndicatorConfig {
        if let Some(PeriodSetting(p)) = self.sma {
            config.sma = p;
        }
        if let Some(PeriodSetting(p)) = self.ema {
            config.ema = p;
        }
        if let Some(PeriodSetting(p)) = self.rsi {
            config.rsi = p;
        }
        if let Some(PeriodSetting(p)) = self.vol {
            config.volatility = p;
        }
        if self.no_macd {
            config.macd = None;
        }
        if self.no_bb {
            config.bollinger = None;
        }
        config
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Fetch {
            symbol,
            interval,
            limit,
            start_ms,
            end_ms,
            output,
            config,
        } => {
            let source = SourceArgs {
                symbol: Some(symbol),
                interval,
                limit,
                start_ms,
                end_ms,
                ..SourceArgs::default()
            };
            run_fetch(&source, &output, config.as_deref())
        }
        Command::Indicators {
            source,
            output,
            config,
            sma,
            ema,
            rsi,
            vol,
            no_macd,
            no_bb,
        } => {
            let overrides = IndicatorOverrides {
                sma,
                ema,
                rsi,
                vol,
                no_macd,
                no_bb,
            };
            run_indicators(&source, &output, config.as_deref(), &overrides)
        }
        Command::Backtest {
            source,
            fast,
            slow,
            config,
            export,
            output,
        } => run_backtest(
            &source,
            fast,
            slow,
            config.as_deref(),
            export.as_deref(),
            output.as_deref(),
        ),
        Command::Summary { source, config } => run_summary(&source, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads an INI file, or an empty config when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, BarlyticsError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// Resolves the source arguments to a price series.
pub fn load_series(
    source: &SourceArgs,
    config: &dyn ConfigPort,
) -> Result<PriceSeries, BarlyticsError> {
    if let Some(path) = &source.input {
        info!(path = %path.display(), "reading bars");
        return CsvAdapter::read_series(path);
    }

    let symbol = source.symbol.as_deref().ok_or_else(|| BarlyticsError::ConfigMissing {
        section: "source".into(),
        key: "symbol".into(),
    })?;
    let request = request_from_config(config, symbol, source.interval.as_deref(), source.limit)?
        .with_range(source.start_ms, source.end_ms);

    let port: Box<dyn DataPort> = match &source.data_dir {
        Some(dir) => Box::new(CsvAdapter::new(dir.clone())),
        None => Box::new(BinanceAdapter::new(&BinanceConfig::from_config(config)?)?),
    };
    let series = port.fetch_series(&request)?;
    if series.is_empty() {
        warn!(symbol = %request.symbol, interval = %request.interval, "no bars returned");
    }
    Ok(series)
}

fn run_fetch(
    source: &SourceArgs,
    output: &Path,
    config_path: Option<&Path>,
) -> Result<(), BarlyticsError> {
    let config = load_config(config_path)?;
    let series = load_series(source, &config)?;
    CsvExporter::new(output.to_path_buf()).write_series(&series)
}

fn run_indicators(
    source: &SourceArgs,
    output: &Path,
    config_path: Option<&Path>,
    overrides: &IndicatorOverrides,
) -> Result<(), BarlyticsError> {
    let config = load_config(config_path)?;
    let indicator_config = overrides.apply(build_indicator_config(&config)?);
    indicator_config.validate()?;

    let series = load_series(source, &config)?;
    let table = apply_indicators(&series, &indicator_config)?;
    CsvExporter::new(output.to_path_buf()).write_table(&table)
}

/// Command-line spans replace the `[backtest]` ones individually.
pub fn resolve_crossover_config(
    config: &dyn ConfigPort,
    fast: Option<usize>,
    slow: Option<usize>,
) -> Result<CrossoverConfig, BarlyticsError> {
    let base = build_crossover_config(config)?;
    CrossoverConfig::new(fast.unwrap_or(base.fast), slow.unwrap_or(base.slow))
}

fn run_backtest(
    source: &SourceArgs,
    fast: Option<usize>,
    slow: Option<usize>,
    config_path: Option<&Path>,
    export: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), BarlyticsError> {
    let config = load_config(config_path)?;
    let crossover = resolve_crossover_config(&config, fast, slow)?;
    let series = load_series(source, &config)?;

    info!(
        fast = crossover.fast,
        slow = crossover.slow,
        bars = series.len(),
        "running crossover backtest"
    );
    let run = run_crossover(&series, &crossover)?;

    if let Some(path) = export {
        CsvExporter::new(path.to_path_buf()).write_crossover(&run)?;
    }
    emit_json(&run.result, output)
}

fn run_summary(source: &SourceArgs, config_path: Option<&Path>) -> Result<(), BarlyticsError> {
    let config = load_config(config_path)?;
    let series = load_series(source, &config)?;
    emit_json(&Summary::compute(&series), None)
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), BarlyticsError> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json + "\n")?;
            info!(path = %path.display(), "wrote result");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let overrides = IndicatorOverrides {
            sma: Some(PeriodSetting(Some(5))),
            rsi: Some(PeriodSetting(None)),
            no_macd: true,
            ..IndicatorOverrides::default()
        };
        let config = overrides.apply(IndicatorConfig::default());
        assert_eq!(config.sma, Some(5));
        assert_eq!(config.rsi, None);
        assert_eq!(config.ema, IndicatorConfig::default().ema);
        assert!(config.macd.is_none());
        assert!(config.bollinger.is_some());
    }

    #[test]
    fn crossover_flags_override_config() {
        let config = FileConfigAdapter::from_string("[backtest]\nfast = 5\nslow = 30\n").unwrap();
        let resolved = resolve_crossover_config(&config, None, Some(40)).unwrap();
        assert_eq!((resolved.fast, resolved.slow), (5, 40));

        assert!(resolve_crossover_config(&config, Some(0), None).is_err());
    }

    #[test]
    fn cli_parses_source_and_switches() {
        let cli = Cli::try_parse_from([
            "barlytics", "indicators", "--input", "bars.csv", "--output", "out.csv", "--sma",
            "off", "--ema", "9", "--no-bb",
        ])
        .unwrap();
        match cli.command {
            Command::Indicators {
                source,
                sma,
                ema,
                no_bb,
                no_macd,
                ..
            } => {
                assert_eq!(source.input, Some(PathBuf::from("bars.csv")));
                assert_eq!(sma, Some(PeriodSetting(None)));
                assert_eq!(ema, Some(PeriodSetting(Some(9))));
                assert!(no_bb);
                assert!(!no_macd);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_a_source() {
        assert!(Cli::try_parse_from(["barlytics", "summary"]).is_err());
        assert!(
            Cli::try_parse_from(["barlytics", "summary", "--input", "a.csv", "--symbol", "X"])
                .is_err()
        );
    }

    #[test]
    fn window_flags_need_a_symbol_source() {
        let flags = [
            ["--limit", "2"],
            ["--interval", "4h"],
            ["--start-ms", "0"],
            ["--end-ms", "1"],
        ];
        for flag in flags {
            let args = ["barlytics", "summary", "--input", "bars.csv", flag[0], flag[1]];
            assert!(Cli::try_parse_from(args).is_err(), "{} accepted with --input", flag[0]);
        }

        let cli = Cli::try_parse_from([
            "barlytics", "summary", "--symbol", "BTCUSDT", "--limit", "2", "--start-ms", "0",
        ])
        .unwrap();
        match cli.command {
            Command::Summary { source, .. } => {
                assert_eq!(source.limit, Some(2));
                assert_eq!(source.start_ms, Some(0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_zero_period() {
        assert!(Cli::try_parse_from([
            "barlytics", "indicators", "--input", "a.csv", "--output", "b.csv", "--rsi", "0",
        ])
        .is_err());
    }
}
