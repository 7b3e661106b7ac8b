//! Simple Moving Average: arithmetic mean of the last n closes.
//!
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 {
        values.extend(bars.iter().map(|b| invalid_point(b.timestamp)));
        return IndicatorSeries {
            kind: IndicatorKind::Sma(period),
            values,
        };
    }

    let mut sum = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }
        if i + 1 >= period {
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(sum / period as f64),
            });
        } else {
            values.push(invalid_point(bar.timestamp));
        }
    }

    IndicatorSeries {
        kind: IndicatorKind::Sma(period),
        values,
    }
}
