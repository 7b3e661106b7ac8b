//! Average True Range with Wilder smoothing.
//!
//! Seed: mean of the first n true ranges (bar 0 uses high - low).
//! Subsequent: ATR = (prev × (n-1) + TR) / n.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 {
        values.extend(bars.iter().map(|b| invalid_point(b.timestamp)));
        return IndicatorSeries {
            kind: IndicatorKind::Atr(period),
            values,
        };
    }

    let mut atr = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };

        if i + 1 < period {
            atr += tr;
            values.push(invalid_point(bar.timestamp));
        } else if i + 1 == period {
            atr = (atr + tr) / period as f64;
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(atr),
            });
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(atr),
            });
        }
    }

    IndicatorSeries {
        kind: IndicatorKind::Atr(period),
        values,
    }
}
