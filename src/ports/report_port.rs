//! Output port for computed tables.

use crate::domain::backtest::CrossoverRun;
use crate::domain::error::BarlyticsError;
use crate::domain::indicator_table::IndicatorTable;

/// Destination for indicator tables and annotated backtest series.
pub trait TableSink {
    fn write_table(&self, table: &IndicatorTable) -> Result<(), BarlyticsError>;

    fn write_crossover(&self, run: &CrossoverRun) -> Result<(), BarlyticsError>;
}
