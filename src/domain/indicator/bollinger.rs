//! Bollinger Bands.
//!
//! Middle = SMA(n); Upper/Lower = Middle ± multiplier × population stddev
//! over the same window. Defaults: period 20, multiplier 2.0 (stored as
//! an integer ×100 so the kind stays hashable). Warmup: (n-1) bars.

use crate::domain::indicator::stddev::population_stddev;
use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[PriceBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let kind = IndicatorKind::Bollinger {
        period,
        stddev_mult_x100,
    };
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 {
        values.extend(bars.iter().map(|b| invalid_point(b.timestamp)));
        return IndicatorSeries { kind, values };
    }

    let mult = stddev_mult_x100 as f64 / 100.0;

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(invalid_point(bar.timestamp));
            continue;
        }
        let window = &bars[i + 1 - period..=i];
        let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
        let stddev = population_stddev(window);

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            },
        });
    }

    IndicatorSeries { kind, values }
}
