//! CSV export of indicator tables and crossover runs.
//!
//! Undefined values are written as empty fields, the same convention
//! `CsvAdapter` reads back as missing.

use crate::domain::backtest::CrossoverRun;
use crate::domain::error::BarlyticsError;
use crate::domain::indicator_table::IndicatorTable;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::report_port::TableSink;
use std::path::PathBuf;
use tracing::info;

const BAR_COLUMNS: [&str; 7] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
];

const CROSSOVER_COLUMNS: [&str; 8] = [
    "ema_fast",
    "ema_slow",
    "signal",
    "position",
    "return",
    "strategy_return",
    "equity",
    "drawdown",
];

pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Writes the bars alone, e.g. after a remote fetch.
    pub fn write_series(&self, series: &PriceSeries) -> Result<(), BarlyticsError> {
        let mut wtr = csv::Writer::from_path(&self.path)?;
        wtr.write_record(BAR_COLUMNS)?;
        for bar in series.bars() {
            wtr.write_record(bar_fields(bar))?;
        }
        wtr.flush()?;
        info!(path = %self.path.display(), rows = series.len(), "wrote bars");
        Ok(())
    }
}

impl TableSink for CsvExporter {
    fn write_table(&self, table: &IndicatorTable) -> Result<(), BarlyticsError> {
        let mut wtr = csv::Writer::from_path(&self.path)?;

        let mut header: Vec<String> = BAR_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(table.column_names());
        wtr.write_record(&header)?;

        let columns: Vec<&[Option<f64>]> = table.columns().map(|(_, values)| values).collect();
        for (i, bar) in table.series().bars().iter().enumerate() {
            let mut row = bar_fields(bar);
            row.extend(columns.iter().map(|c| format_value(c[i])));
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        info!(
            path = %self.path.display(),
            rows = table.len(),
            columns = header.len(),
            "wrote indicator table"
        );
        Ok(())
    }

    fn write_crossover(&self, run: &CrossoverRun) -> Result<(), BarlyticsError> {
        let mut wtr = csv::Writer::from_path(&self.path)?;

        let header: Vec<&str> = BAR_COLUMNS.iter().chain(&CROSSOVER_COLUMNS).copied().collect();
        wtr.write_record(&header)?;

        let f = &run.frame;
        for (i, bar) in run.series.bars().iter().enumerate() {
            let mut row = bar_fields(bar);
            row.extend([
                format_float(f.ema_fast[i]),
                format_float(f.ema_slow[i]),
                f.signal[i].to_string(),
                f.position[i].to_string(),
                format_float(f.market_return[i]),
                format_float(f.strategy_return[i]),
                format_float(f.equity[i]),
                format_float(f.drawdown[i]),
            ]);
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        info!(path = %self.path.display(), rows = run.series.len(), "wrote crossover series");
        Ok(())
    }
}

fn bar_fields(bar: &PriceBar) -> Vec<String> {
    vec![
        bar.open_time.to_rfc3339(),
        format_float(bar.open),
        format_float(bar.high),
        format_float(bar.low),
        format_float(bar.close),
        format_float(bar.volume),
        bar.close_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
    ]
}

fn format_value(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

fn format_float(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}
