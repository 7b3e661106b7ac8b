//! OHLCV price bars and validated price series.

use crate::domain::error::TradecastError;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One OHLCV observation for a fixed time interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: Option<f64>,
}

impl PriceBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// A price series validated at construction: strictly increasing timestamps,
/// positive prices, `low <= min(open, close)`, `high >= max(open, close)`,
/// non-negative volume. The engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, TradecastError> {
        for (i, bar) in bars.iter().enumerate() {
            if bar.open <= 0.0 || bar.high <= 0.0 || bar.low <= 0.0 || bar.close <= 0.0 {
                return Err(TradecastError::InvalidInput {
                    reason: format!("non-positive price at bar {}", i),
                });
            }
            if bar.low > bar.open.min(bar.close) || bar.high < bar.open.max(bar.close) {
                return Err(TradecastError::InvalidInput {
                    reason: format!("bar {} violates low <= open,close <= high", i),
                });
            }
            if bar.volume < 0.0 {
                return Err(TradecastError::InvalidInput {
                    reason: format!("negative volume at bar {}", i),
                });
            }
            if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
                return Err(TradecastError::InvalidInput {
                    reason: format!("timestamps not strictly increasing at bar {}", i),
                });
            }
        }
        Ok(PriceSeries { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

/// Bar interval of a request. The engine's math is interval-agnostic; the
/// timeframe only annotates results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1w",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "1d" => Ok(Timeframe::Day1),
            "1w" => Ok(Timeframe::Week1),
            other => Err(format!("unknown timeframe: {}", other)),
        }
    }
}

/// A tradable instrument reference carried through results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    pub exchange: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Crypto,
    Future,
    Option,
}
