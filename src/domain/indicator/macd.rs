//! Moving Average Convergence Divergence.
//!
//! MACD line = EMA(fast) - EMA(slow); signal line = EMA(signal) of the MACD
//! line; histogram = line - signal. Defaults 12/26/9.
//! Warmup: (slow - 1) + (signal - 1) bars.

use crate::domain::indicator::ema::ema_raw;
use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let kind = IndicatorKind::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            kind,
            values: bars.iter().map(|b| invalid_point(b.timestamp)).collect(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_raw(&closes, fast);
    let ema_slow = ema_raw(&closes, slow);

    // MACD line exists once both EMAs are valid; the signal line is then
    // seeded with the SMA of the first `signal_period` MACD values.
    let macd_warmup = fast.max(slow).saturating_sub(1);
    let line: Vec<f64> = (0..bars.len())
        .map(|i| match (ema_fast[i], ema_slow[i]) {
            (Some(f), Some(s)) => f - s,
            _ => 0.0,
        })
        .collect();

    let defined: Vec<f64> = line.iter().skip(macd_warmup).copied().collect();
    let signal_raw = ema_raw(&defined, signal_period);

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let signal = if i >= macd_warmup {
            signal_raw[i - macd_warmup]
        } else {
            None
        };
        match signal {
            Some(sig) => values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Macd {
                    line: line[i],
                    signal: sig,
                    histogram: line[i] - sig,
                },
            }),
            None => values.push(invalid_point(bar.timestamp)),
        }
    }

    IndicatorSeries { kind, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
                vwap: None,
            })
            .collect()
    }

    #[test]
    fn macd_warmup_with_defaults() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
        // slow-1 + signal-1 = 25 + 8 = 33
        for i in 0..33 {
            assert!(!series.values[i].valid, "bar {} should be invalid", i);
        }
        assert!(series.values[33].valid);
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let bars = make_bars(&[100.0; 40]);
        let series = calculate_macd(&bars, 12, 26, 9);
        for point in series.values.iter().filter(|p| p.valid) {
            match point.value {
                IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                } => {
                    assert!(line.abs() < 1e-9);
                    assert!(signal.abs() < 1e-9);
                    assert!(histogram.abs() < 1e-9);
                }
                _ => panic!("expected Macd value"),
            }
        }
    }

    #[test]
    fn macd_uptrend_is_positive() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);
        let last = series.values.last().unwrap();
        assert!(last.valid);
        match last.value {
            IndicatorValue::Macd { line, .. } => assert!(line > 0.0),
            _ => panic!("expected Macd value"),
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let prices: Vec<f64> = (0..50)
            .map(|i| 100.0 + ((i as f64) * 0.3).sin() * 8.0)
            .collect();
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 12, 26, 9);
        for point in series.values.iter().filter(|p| p.valid) {
            match point.value {
                IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                } => assert!((histogram - (line - signal)).abs() < 1e-12),
                _ => panic!("expected Macd value"),
            }
        }
    }

    #[test]
    fn macd_zero_parameter_all_invalid() {
        let bars = make_bars(&[100.0; 10]);
        let series = calculate_macd(&bars, 0, 26, 9);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn macd_short_series_all_invalid() {
        let bars = make_bars(&[100.0; 20]);
        let series = calculate_macd(&bars, 12, 26, 9);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
