//! Market data port trait.

use crate::domain::error::TradecastError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Fetch a validated price series for the symbol, bounded by the
    /// requested range when given.
    fn fetch_series(
        &self,
        symbol: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<PriceSeries, TradecastError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradecastError>;
}
