//! JSON report rendering.
//!
//! The serialized form of `ForecastResult` and `BacktestResult` is the
//! wire contract: field names are fixed and output for identical inputs
//! is byte-identical.

use crate::domain::error::TradecastError;
use serde::Serialize;

pub fn render<T: Serialize>(value: &T) -> Result<String, TradecastError> {
    Ok(serde_json::to_string_pretty(value)?)
}
