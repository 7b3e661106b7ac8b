//! Volume-Weighted Average Price.
//!
//! Cumulative (typical price × volume) / cumulative volume over the full
//! series; sessions are not modeled. Bars before the first traded volume
//! are invalid (no volume to weight by).

use crate::domain::indicator::{invalid_point, IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::price::PriceBar;

pub fn calculate_vwap(bars: &[PriceBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    for bar in bars {
        cum_pv += bar.typical_price() * bar.volume;
        cum_volume += bar.volume;

        if cum_volume > 0.0 {
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(cum_pv / cum_volume),
            });
        } else {
            values.push(invalid_point(bar.timestamp));
        }
    }

    IndicatorSeries {
        kind: IndicatorKind::Vwap,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64, volume: f64) -> PriceBar {
        PriceBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume,
            vwap: None,
        }
    }

    fn simple(point: &IndicatorPoint) -> f64 {
        match point.value {
            IndicatorValue::Simple(v) => v,
            _ => panic!("expected Simple value"),
        }
    }

    #[test]
    fn vwap_single_bar_is_typical_price() {
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0, 500.0)];
        let series = calculate_vwap(&bars);
        let expected = (110.0 + 90.0 + 100.0) / 3.0;
        assert!(series.values[0].valid);
        assert!((simple(&series.values[0]) - expected).abs() < 1e-9);
    }

    #[test]
    fn vwap_weights_by_volume() {
        let bars = vec![
            make_bar(1, 100.0, 100.0, 100.0, 100.0),
            make_bar(2, 200.0, 200.0, 200.0, 300.0),
        ];
        let series = calculate_vwap(&bars);
        // (100*100 + 200*300) / 400 = 175
        assert!((simple(&series.values[1]) - 175.0).abs() < 1e-9);
    }

    #[test]
    fn vwap_zero_volume_prefix_is_invalid() {
        let bars = vec![
            make_bar(1, 100.0, 100.0, 100.0, 0.0),
            make_bar(2, 100.0, 100.0, 100.0, 500.0),
        ];
        let series = calculate_vwap(&bars);
        assert!(!series.values[0].valid);
        assert!(series.values[1].valid);
    }

    #[test]
    fn vwap_is_cumulative() {
        let bars: Vec<PriceBar> = (1..=5)
            .map(|i| make_bar(i, 100.0 + i as f64, 100.0 + i as f64, 100.0 + i as f64, 100.0))
            .collect();
        let series = calculate_vwap(&bars);
        // Equal volumes: VWAP of bar i is the mean of typical prices so far.
        let last = simple(series.values.last().unwrap());
        assert!((last - 103.0).abs() < 1e-9);
    }
}
