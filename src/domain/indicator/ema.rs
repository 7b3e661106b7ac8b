//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let raw = ema_raw(&closes, period);

    let values = bars
        .iter()
        .zip(raw)
        .map(|(bar, value)| match value {
            Some(v) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(v),
            },
            None => invalid_point(bar.timestamp),
        })
        .collect();

    IndicatorSeries {
        kind: IndicatorKind::Ema(period),
        values,
    }
}

/// EMA over an arbitrary input sequence; `None` during warmup. Shared with
/// the MACD signal line, which smooths the MACD line rather than closes.
pub(crate) fn ema_raw(input: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period == 0 || input.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = input[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for i in period..input.len() {
        ema = input[i] * k + ema * (1.0 - k);
        out[i] = Some(ema);
    }
    out
}
