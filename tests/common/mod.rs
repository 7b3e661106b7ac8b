#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tradecast::domain::error::TradecastError;
use tradecast::domain::forecast::FeatureVector;
use tradecast::domain::price::{Asset, AssetType, PriceBar, PriceSeries};
use tradecast::domain::rule::{Combine, NamedRule, Operand, Rule, RuleSet};
use tradecast::domain::signal::Prediction;
use tradecast::domain::strategy::{AssetClass, RiskLevel, Strategy, StrategyCategory};
use tradecast::ports::data_port::DataPort;
use tradecast::ports::predictor_port::PredictorPort;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(day_offset: i64, close: f64, volume: f64) -> PriceBar {
    PriceBar {
        timestamp: date(2024, 1, 1) + chrono::Duration::days(day_offset),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume,
        vwap: None,
    }
}

/// Daily series from closes, constant volume.
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(i as i64, close, 1_000.0))
        .collect();
    PriceSeries::new(bars).unwrap()
}

pub fn make_asset(symbol: &str) -> Asset {
    Asset {
        symbol: symbol.to_string(),
        name: format!("{} Test", symbol),
        asset_type: AssetType::Stock,
        exchange: None,
    }
}

/// Long strategy whose single entry rule always holds on positive closes.
pub fn always_long_strategy() -> Strategy {
    Strategy {
        id: "test_always_long".into(),
        name: "Always Long".into(),
        asset_class: AssetClass::Equity,
        category: StrategyCategory::Long,
        risk_level: RiskLevel::Medium,
        capital_required: 10_000.0,
        max_loss: Some(500.0),
        max_profit: Some(1_500.0),
        success_rate: Some(0.6),
        avg_return_pct: Some(8.0),
        entry_rules: RuleSet::new(
            vec![NamedRule {
                name: "always".into(),
                rule: Rule::Above {
                    left: Operand::Close,
                    right: Operand::Constant(0.0),
                },
            }],
            Combine::AllOf,
        ),
        exit_rules: RuleSet::empty(),
        max_holding_days: 365,
    }
}

/// SMA-crossover strategy used by the flat-series scenario.
pub fn crossover_strategy() -> Strategy {
    let mut strategy = always_long_strategy();
    strategy.id = "test_crossover".into();
    strategy.name = "SMA Crossover".into();
    strategy.entry_rules = RuleSet::new(
        vec![NamedRule {
            name: "golden cross".into(),
            rule: tradecast::domain::rule_parser::parse("CROSS_ABOVE(SMA(5), SMA(10))").unwrap(),
        }],
        Combine::AllOf,
    );
    strategy
}

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        _start: Option<NaiveDateTime>,
        _end: Option<NaiveDateTime>,
    ) -> Result<PriceSeries, TradecastError> {
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| TradecastError::DataSource {
                reason: format!("no data for {}", symbol),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradecastError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Predictor returning a fixed answer, or `None` to test degradation.
pub struct MockPredictor(pub Option<Prediction>);

impl PredictorPort for MockPredictor {
    fn predict(&self, _features: &FeatureVector) -> Option<Prediction> {
        self.0
    }
}
