//! Forecast generation.
//!
//! Pipeline: compute the indicator set, evaluate the strategy's entry
//! rules at the latest bar, extract the feature vector, ask the optional
//! prediction model, blend, then derive entry and exit levels. Every step
//! is deterministic; identical inputs serialize byte-identically (the
//! result carries no timestamp).

use crate::domain::backtest::MIN_HISTORY_BARS;
use crate::domain::error::TradecastError;
use crate::domain::indicator::{compute_indicators, IndicatorKind, IndicatorSet, IndicatorValue};
use crate::domain::price::{Asset, PriceBar, PriceSeries, Timeframe};
use crate::domain::rule_eval::{self, RuleSetOutcome};
use crate::domain::signal::{blend, BlendWeights, Prediction, CONFIDENCE_FLOOR};
use crate::domain::strategy::{Bias, Strategy};
use crate::ports::predictor_port::PredictorPort;
use serde::Serialize;
use std::collections::BTreeMap;

/// Feature values keyed by name; missing history is `None`, never zero.
pub type FeatureVector = BTreeMap<String, Option<f64>>;

/// Confidence penalty applied when no rule fired.
const UNFIRED_PENALTY: f64 = 30.0;

const ATR_STOP_MULT: f64 = 2.0;
const ATR_TARGET_MULT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastParams {
    pub weights: BlendWeights,
    pub confidence_floor: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        ForecastParams {
            weights: BlendWeights::default(),
            confidence_floor: CONFIDENCE_FLOOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub strategy: Strategy,
    pub asset: Asset,
    pub is_valid: bool,
    /// Clamped to [0, 100].
    pub confidence: f64,
    /// Expected dollar return on the strategy's required capital.
    pub expected_return: f64,
    /// `None` when implied risk is zero or no exit levels exist.
    pub reward_risk_ratio: Option<f64>,
    /// Clamped to [0, 1].
    pub win_probability: f64,
    /// At most three levels, ascending. Empty when invalid.
    pub entry_points: Vec<f64>,
    /// `[stop, target]`; `None` for neutral strategies without bounds.
    pub exit_points: Option<Vec<f64>>,
    pub reasoning: String,
    pub technical_conditions: Vec<String>,
    pub ml_features: FeatureVector,
}

/// The fixed indicator set the feature extractor reads, beyond whatever
/// the strategy's rules reference.
fn feature_kinds() -> [IndicatorKind; 5] {
    [
        IndicatorKind::Rsi(14),
        IndicatorKind::Sma(20),
        IndicatorKind::Sma(50),
        IndicatorKind::Atr(14),
        IndicatorKind::Stddev(20),
    ]
}

fn simple_at(indicators: &IndicatorSet, kind: IndicatorKind, index: usize) -> Option<f64> {
    let point = indicators.get(&kind)?.values.get(index)?;
    if !point.valid {
        return None;
    }
    match point.value {
        IndicatorValue::Simple(v) => Some(v),
        _ => None,
    }
}

/// Extract the feature vector at the last bar.
pub fn extract_features(bars: &[PriceBar], indicators: &IndicatorSet) -> FeatureVector {
    let mut features = FeatureVector::new();
    let last = bars.len() - 1;
    let close = bars[last].close;

    let momentum = (bars.len() > 20).then(|| close / bars[last - 20].close - 1.0);
    features.insert("price_momentum".into(), momentum);

    features.insert("rsi".into(), simple_at(indicators, IndicatorKind::Rsi(14), last));

    let volume_ratio = (bars.len() >= 10).then(|| {
        let avg: f64 = bars[bars.len() - 10..].iter().map(|b| b.volume).sum::<f64>() / 10.0;
        if avg > 0.0 {
            bars[last].volume / avg
        } else {
            0.0
        }
    });
    features.insert("volume_ratio".into(), volume_ratio);

    let volatility = simple_at(indicators, IndicatorKind::Stddev(20), last).map(|sd| {
        let mean: f64 = bars[bars.len() - 20..].iter().map(|b| b.close).sum::<f64>() / 20.0;
        if mean > 0.0 { sd / mean } else { 0.0 }
    });
    features.insert("volatility".into(), volatility);

    let trend_strength = match (
        simple_at(indicators, IndicatorKind::Sma(20), last),
        simple_at(indicators, IndicatorKind::Sma(50), last),
    ) {
        (Some(sma20), Some(sma50)) if sma50 > 0.0 => Some((sma20 - sma50).abs() / sma50),
        _ => None,
    };
    features.insert("trend_strength".into(), trend_strength);

    features
}

fn entry_levels(close: f64, bias: Bias, indicators: &IndicatorSet, last: usize) -> Vec<f64> {
    let mut levels = match bias {
        Bias::Long => {
            let mut v = vec![close * 0.99, close * 0.975, close * 0.96];
            if let Some(sma20) = simple_at(indicators, IndicatorKind::Sma(20), last) {
                v.push(sma20);
            }
            v
        }
        Bias::Short => vec![close * 1.01, close * 1.025, close * 1.04],
        Bias::Neutral => vec![close * 0.995, close, close * 1.005],
    };
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    levels.truncate(3);
    levels
}

/// `[stop, target]` around the close, from the strategy's dollar bounds
/// when present, otherwise from ATR multiples. Neutral strategies without
/// bounds get no exit levels.
fn exit_levels(
    close: f64,
    strategy: &Strategy,
    indicators: &IndicatorSet,
    last: usize,
) -> Option<Vec<f64>> {
    let bias = strategy.bias();

    if let (Some(max_loss), Some(max_profit)) = (strategy.max_loss, strategy.max_profit) {
        let loss_frac = max_loss / strategy.capital_required;
        let profit_frac = max_profit / strategy.capital_required;
        return Some(match bias {
            Bias::Long | Bias::Neutral => {
                vec![close * (1.0 - loss_frac), close * (1.0 + profit_frac)]
            }
            Bias::Short => vec![close * (1.0 + loss_frac), close * (1.0 - profit_frac)],
        });
    }

    let atr = simple_at(indicators, IndicatorKind::Atr(14), last)?;
    match bias {
        Bias::Long => Some(vec![close - ATR_STOP_MULT * atr, close + ATR_TARGET_MULT * atr]),
        Bias::Short => Some(vec![close + ATR_STOP_MULT * atr, close - ATR_TARGET_MULT * atr]),
        Bias::Neutral => None,
    }
}

fn reward_risk(close: f64, exit_points: Option<&Vec<f64>>) -> Option<f64> {
    let exits = exit_points?;
    let [stop, target] = exits.as_slice() else {
        return None;
    };
    let risk = (close - stop).abs();
    let reward = (target - close).abs();
    (risk > 0.0).then(|| reward / risk)
}

fn reasoning_text(
    strategy: &Strategy,
    asset: &Asset,
    timeframe: Timeframe,
    outcome: &RuleSetOutcome,
    confidence: f64,
) -> String {
    let mut parts = vec![format!(
        "Analyzing {} for {} on the {} timeframe.",
        strategy.name, asset.symbol, timeframe
    )];

    if outcome.fired {
        parts.push("Technical conditions are favorable:".to_string());
        for condition in &outcome.satisfied {
            parts.push(format!("- {}", condition));
        }
    } else if outcome.satisfied.is_empty() {
        parts.push("No technical condition is currently satisfied.".to_string());
    } else {
        parts.push(format!(
            "Technical conditions are partially met ({} of {}):",
            outcome.satisfied.len(),
            strategy.entry_rules.rules.len()
        ));
        for condition in &outcome.satisfied {
            parts.push(format!("- {}", condition));
        }
    }

    let band = if confidence > 70.0 {
        "high"
    } else if confidence > 50.0 {
        "moderate"
    } else {
        "low"
    };
    parts.push(format!(
        "Blended signal confidence is {} ({:.1}/100).",
        band, confidence
    ));

    parts.join("\n")
}

pub fn generate_forecast(
    asset: &Asset,
    strategy: &Strategy,
    series: &PriceSeries,
    timeframe: Timeframe,
    predictor: Option<&dyn PredictorPort>,
    params: &ForecastParams,
) -> Result<ForecastResult, TradecastError> {
    let bars = series.bars();
    let minimum = strategy.required_history().max(MIN_HISTORY_BARS);
    if bars.len() < minimum {
        return Err(TradecastError::InsufficientData {
            symbol: asset.symbol.clone(),
            bars: bars.len(),
            minimum,
        });
    }

    let mut kinds: Vec<IndicatorKind> = strategy.entry_rules.referenced_indicators();
    for kind in feature_kinds() {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    let indicators = compute_indicators(bars, &kinds);

    let last = bars.len() - 1;
    let close = bars[last].close;
    let outcome = rule_eval::evaluate_set(&strategy.entry_rules, bars, &indicators, last);
    let features = extract_features(bars, &indicators);

    let prediction: Option<Prediction> = predictor.and_then(|p| p.predict(&features));
    let blended = blend(&outcome, prediction, strategy, params.weights);

    let is_valid = outcome.fired || blended.confidence >= params.confidence_floor;
    let confidence = if outcome.fired {
        blended.confidence
    } else {
        (blended.confidence - UNFIRED_PENALTY).max(0.0)
    };

    let entry_points = if is_valid {
        entry_levels(close, strategy.bias(), &indicators, last)
    } else {
        Vec::new()
    };
    let exit_points = if is_valid {
        exit_levels(close, strategy, &indicators, last)
    } else {
        None
    };
    let reward_risk_ratio = reward_risk(close, exit_points.as_ref());

    let expected_return = if is_valid {
        strategy.capital_required * blended.expected_return_pct / 100.0
    } else {
        0.0
    };

    let reasoning = reasoning_text(strategy, asset, timeframe, &outcome, confidence);

    Ok(ForecastResult {
        strategy: strategy.clone(),
        asset: asset.clone(),
        is_valid,
        confidence,
        expected_return,
        reward_risk_ratio,
        win_probability: blended.win_probability,
        entry_points,
        exit_points,
        reasoning,
        technical_conditions: outcome.satisfied,
        ml_features: features,
    })
}

/// Forecast several strategies against one series, best confidence first;
/// ties break on strategy id so the order is stable.
pub fn batch_forecast(
    asset: &Asset,
    strategies: &[Strategy],
    series: &PriceSeries,
    timeframe: Timeframe,
    predictor: Option<&dyn PredictorPort>,
    params: &ForecastParams,
) -> Result<Vec<ForecastResult>, TradecastError> {
    let mut results = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        results.push(generate_forecast(
            asset, strategy, series, timeframe, predictor, params,
        )?);
    }
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.strategy.id.cmp(&b.strategy.id))
    });
    Ok(results)
}
