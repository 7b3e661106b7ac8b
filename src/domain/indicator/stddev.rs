//! Rolling population standard deviation of closes.
//!
//! Divides by N, not N-1, consistent with the Bollinger computation.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub fn calculate_stddev(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 {
        values.extend(bars.iter().map(|b| invalid_point(b.timestamp)));
        return IndicatorSeries {
            kind: IndicatorKind::Stddev(period),
            values,
        };
    }

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(invalid_point(bar.timestamp));
            continue;
        }
        let window = &bars[i + 1 - period..=i];
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Simple(population_stddev(window)),
        });
    }

    IndicatorSeries {
        kind: IndicatorKind::Stddev(period),
        values,
    }
}

/// Population standard deviation of a window's closes.
pub(crate) fn population_stddev(window: &[PriceBar]) -> f64 {
    let n = window.len() as f64;
    let mean = window.iter().map(|b| b.close).sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|b| {
            let diff = b.close - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}
