//! Technical indicator library.
//!
//! Every indicator is a pure function from a slice of price bars to an
//! [`IndicatorSeries`] aligned with the input: same length, with leading
//! points marked invalid until the lookback window is filled. No indicator
//! reads past its own bar index.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod vwap;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use vwap::calculate_vwap;

use crate::domain::price::PriceBar;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A single point in an indicator time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

/// Output shape of an indicator at one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

/// Indicator identity plus parameters. Serves as the lookup key for a
/// computed indicator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorKind {
    /// Number of bars before the first valid point.
    pub fn lookback(&self) -> usize {
        match self {
            IndicatorKind::Sma(n) | IndicatorKind::Ema(n) | IndicatorKind::Stddev(n) => {
                n.saturating_sub(1)
            }
            // RSI needs n price changes, ATR seeds on the first n true ranges.
            IndicatorKind::Rsi(n) => *n,
            IndicatorKind::Atr(n) => n.saturating_sub(1),
            IndicatorKind::Vwap => 0,
            IndicatorKind::Macd { slow, signal, .. } => {
                slow.saturating_sub(1) + signal.saturating_sub(1)
            }
            IndicatorKind::Bollinger { period, .. } => period.saturating_sub(1),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKind::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorKind::Vwap => write!(f, "VWAP"),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorKind::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// A time series of indicator values aligned with its source bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<IndicatorPoint>,
}

/// A computed set of indicator series keyed by kind. Built fresh per request,
/// only ever looked up by key afterwards.
pub type IndicatorSet = HashMap<IndicatorKind, IndicatorSeries>;

/// Compute one indicator by kind.
pub fn calculate(kind: IndicatorKind, bars: &[PriceBar]) -> IndicatorSeries {
    match kind {
        IndicatorKind::Sma(n) => calculate_sma(bars, n),
        IndicatorKind::Ema(n) => calculate_ema(bars, n),
        IndicatorKind::Rsi(n) => calculate_rsi(bars, n),
        IndicatorKind::Atr(n) => calculate_atr(bars, n),
        IndicatorKind::Stddev(n) => calculate_stddev(bars, n),
        IndicatorKind::Vwap => calculate_vwap(bars),
        IndicatorKind::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
        IndicatorKind::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(bars, period, stddev_mult_x100),
    }
}

/// Compute every requested indicator over the same bars.
pub fn compute_indicators(bars: &[PriceBar], kinds: &[IndicatorKind]) -> IndicatorSet {
    let mut set = IndicatorSet::with_capacity(kinds.len());
    for &kind in kinds {
        set.entry(kind).or_insert_with(|| calculate(kind, bars));
    }
    set
}

/// Build an invalid placeholder point, used by indicators during warmup.
pub(crate) fn invalid_point(timestamp: NaiveDateTime) -> IndicatorPoint {
    IndicatorPoint {
        timestamp,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    }
}
