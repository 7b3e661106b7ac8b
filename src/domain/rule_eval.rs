//! Rule evaluation against a bar series and precomputed indicators.
//!
//! Operands resolve to f64, with NaN standing in for anything missing: an
//! indicator still in warmup, an absent series, or a field that does not
//! apply. NaN comparisons are false, so a rule over missing data is simply
//! unsatisfied. Evaluation at bar i sees bars 0..=i only.

use crate::domain::indicator::{IndicatorSet, IndicatorValue};
use crate::domain::price::PriceBar;
use crate::domain::rule::{Combine, IndicatorField, Operand, Rule, RuleSet};

/// Outcome of evaluating a rule set at one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetOutcome {
    /// Names of satisfied rules, in rule-set order.
    pub satisfied: Vec<String>,
    /// Whether the combined verdict holds.
    pub fired: bool,
    /// Fraction of rules satisfied, in [0, 1]. Zero for an empty set.
    pub strength: f64,
}

fn resolve_operand(
    operand: &Operand,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    index: usize,
) -> f64 {
    match operand {
        Operand::Open => bars[index].open,
        Operand::High => bars[index].high,
        Operand::Low => bars[index].low,
        Operand::Close => bars[index].close,
        Operand::Volume => bars[index].volume,
        Operand::Constant(v) => *v,
        Operand::Indicator(ind_ref) => {
            let Some(series) = indicators.get(&ind_ref.kind) else {
                return f64::NAN;
            };
            let Some(point) = series.values.get(index) else {
                return f64::NAN;
            };
            if !point.valid {
                return f64::NAN;
            }
            match (&point.value, ind_ref.field) {
                (IndicatorValue::Simple(v), IndicatorField::Value) => *v,
                (IndicatorValue::Macd { line, .. }, IndicatorField::MacdLine) => *line,
                (IndicatorValue::Macd { signal, .. }, IndicatorField::MacdSignal) => *signal,
                (IndicatorValue::Macd { histogram, .. }, IndicatorField::MacdHistogram) => {
                    *histogram
                }
                (IndicatorValue::Bollinger { upper, .. }, IndicatorField::BollingerUpper) => *upper,
                (IndicatorValue::Bollinger { middle, .. }, IndicatorField::BollingerMiddle) => {
                    *middle
                }
                (IndicatorValue::Bollinger { lower, .. }, IndicatorField::BollingerLower) => *lower,
                _ => f64::NAN,
            }
        }
    }
}

/// Evaluate a single rule at the given bar index.
pub fn evaluate(rule: &Rule, bars: &[PriceBar], indicators: &IndicatorSet, index: usize) -> bool {
    if index >= bars.len() {
        return false;
    }
    match rule {
        Rule::Above { left, right } => {
            let l = resolve_operand(left, bars, indicators, index);
            let r = resolve_operand(right, bars, indicators, index);
            l > r
        }
        Rule::Below { left, right } => {
            let l = resolve_operand(left, bars, indicators, index);
            let r = resolve_operand(right, bars, indicators, index);
            l < r
        }
        Rule::CrossAbove { left, right } => {
            if index == 0 {
                return false;
            }
            let l_prev = resolve_operand(left, bars, indicators, index - 1);
            let r_prev = resolve_operand(right, bars, indicators, index - 1);
            let l = resolve_operand(left, bars, indicators, index);
            let r = resolve_operand(right, bars, indicators, index);
            l_prev <= r_prev && l > r
        }
        Rule::CrossBelow { left, right } => {
            if index == 0 {
                return false;
            }
            let l_prev = resolve_operand(left, bars, indicators, index - 1);
            let r_prev = resolve_operand(right, bars, indicators, index - 1);
            let l = resolve_operand(left, bars, indicators, index);
            let r = resolve_operand(right, bars, indicators, index);
            l_prev >= r_prev && l < r
        }
        Rule::Between {
            operand,
            lower,
            upper,
        } => {
            let v = resolve_operand(operand, bars, indicators, index);
            v >= *lower && v <= *upper
        }
    }
}

/// Evaluate every rule in the set at the given bar index and combine.
pub fn evaluate_set(
    set: &RuleSet,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    index: usize,
) -> RuleSetOutcome {
    if set.rules.is_empty() {
        return RuleSetOutcome {
            satisfied: Vec::new(),
            fired: false,
            strength: 0.0,
        };
    }

    let mut satisfied = Vec::new();
    for named in &set.rules {
        if evaluate(&named.rule, bars, indicators, index) {
            satisfied.push(named.name.clone());
        }
    }

    let total = set.rules.len();
    let hits = satisfied.len();
    let fired = match set.combine {
        Combine::AllOf => hits == total,
        Combine::AnyOf => hits > 0,
        Combine::Majority => hits * 2 > total,
    };

    RuleSetOutcome {
        satisfied,
        fired,
        strength: hits as f64 / total as f64,
    }
}
