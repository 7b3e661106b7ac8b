//! Relative Strength Index with Wilder smoothing.
//!
//! First average gain/loss: simple mean over the first n changes.
//! Subsequent: avg = (prev_avg * (n-1) + current) / n.
//! RSI = 100 - 100/(1 + avg_gain/avg_loss).
//! Degenerate cases resolved by policy, never raised: avg_loss = 0 with
//! gains → 100; both averages zero (flat window) → 50.
//!
//! Warmup: first n bars are invalid (n price changes are required).

use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 || bars.len() < 2 {
        values.extend(bars.iter().map(|b| invalid_point(b.timestamp)));
        return IndicatorSeries {
            kind: IndicatorKind::Rsi(period),
            values,
        };
    }

    values.push(invalid_point(bars[0].timestamp));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        if i < period {
            // Accumulating toward the seed average.
            avg_gain += gain;
            avg_loss += loss;
            values.push(invalid_point(bars[i].timestamp));
            continue;
        } else if i == period {
            avg_gain = (avg_gain + gain) / period as f64;
            avg_loss = (avg_loss + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
            50.0
        } else if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };

        values.push(IndicatorPoint {
            timestamp: bars[i].timestamp,
            valid: true,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries {
        kind: IndicatorKind::Rsi(period),
        values,
    }
}
