//! CSV file data adapter.
//!
//! Reads `<SYMBOL>.csv` files with a header row of
//! `timestamp,open,high,low,close,volume`. Timestamps accept either
//! `%Y-%m-%d %H:%M:%S` or a bare `%Y-%m-%d` (midnight). The resulting
//! series goes through `PriceSeries::new`, so invalid data is rejected
//! before it reaches the engine.

use crate::domain::error::TradecastError;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TradecastError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        .map_err(|e| TradecastError::DataSource {
            reason: format!("invalid timestamp '{}': {}", value, e),
        })
}

fn field<'a>(record: &'a csv::StringRecord, index: usize, name: &str) -> Result<&'a str, TradecastError> {
    record.get(index).ok_or_else(|| TradecastError::DataSource {
        reason: format!("missing {} column", name),
    })
}

fn numeric(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, TradecastError> {
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e| TradecastError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        symbol: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<PriceSeries, TradecastError> {
        let path = self.csv_path(symbol);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| TradecastError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| TradecastError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp = parse_timestamp(field(&record, 0, "timestamp")?)?;
            if start.is_some_and(|s| timestamp < s) || end.is_some_and(|e| timestamp > e) {
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                open: numeric(&record, 1, "open")?,
                high: numeric(&record, 2, "high")?,
                low: numeric(&record, 3, "low")?,
                close: numeric(&record, 4, "close")?,
                volume: numeric(&record, 5, "volume")?,
                vwap: None,
            });
        }

        PriceSeries::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradecastError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, symbol: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(format!("{}.csv", symbol))).unwrap();
        write!(file, "{}", content).unwrap();
    }

    const HEADER: &str = "timestamp,open,high,low,close,volume\n";

    #[test]
    fn reads_daily_bars() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "AAPL",
            &format!(
                "{HEADER}2024-01-02,100,105,99,104,10000\n2024-01-03,104,106,103,105,12000\n"
            ),
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let series = adapter.fetch_series("AAPL", None, None).unwrap();
        assert_eq!(series.len(), 2);
        assert!((series.bars()[1].close - 105.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reads_intraday_timestamps() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "BTC",
            &format!(
                "{HEADER}2024-01-02 09:00:00,100,105,99,104,10\n2024-01-02 10:00:00,104,106,103,105,12\n"
            ),
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let series = adapter.fetch_series("BTC", None, None).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "AAPL",
            &format!(
                "{HEADER}2024-01-02,100,105,99,104,10000\n2024-01-03,104,106,103,105,12000\n2024-01-04,105,107,104,106,11000\n"
            ),
        );
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let start = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let series = adapter.fetch_series("AAPL", Some(start), None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].timestamp, start);
    }

    #[test]
    fn missing_file_is_a_data_source_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_series("NOPE", None, None),
            Err(TradecastError::DataSource { .. })
        ));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "BAD", &format!("{HEADER}2024-01-02,100,105,99,oops,10000\n"));
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_series("BAD", None, None),
            Err(TradecastError::DataSource { .. })
        ));
    }

    #[test]
    fn invalid_ohlc_fails_series_validation() {
        // high below close
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "BAD", &format!("{HEADER}2024-01-02,100,101,99,150,10000\n"));
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_series("BAD", None, None),
            Err(TradecastError::InvalidInput { .. })
        ));
    }

    #[test]
    fn lists_symbols_sorted() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "MSFT", HEADER);
        write_csv(&dir, "AAPL", HEADER);
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAPL", "MSFT"]);
    }
}
