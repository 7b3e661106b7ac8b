//! Rule data structures.
//!
//! Rules are a closed set of leaf predicates over indicator values and
//! price fields; there is no nesting. Composition lives one level up in
//! [`RuleSet`], which names each rule and fixes how the set combines.

use crate::domain::error::TradecastError;
use crate::domain::indicator::IndicatorKind;
use serde::Serialize;

/// What a rule can compare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Operand {
    Open,
    High,
    Low,
    Close,
    Volume,
    Constant(f64),
    Indicator(IndicatorRef),
}

/// Reference to an indicator with a field selector for multi-value shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRef {
    pub kind: IndicatorKind,
    pub field: IndicatorField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
}

/// Leaf predicate kinds. Crossovers need one bar of history and are
/// unsatisfied at bar 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Rule {
    Above { left: Operand, right: Operand },
    Below { left: Operand, right: Operand },
    CrossAbove { left: Operand, right: Operand },
    CrossBelow { left: Operand, right: Operand },
    Between { operand: Operand, lower: f64, upper: f64 },
}

/// A rule with the human-readable condition name reported in results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRule {
    pub name: String,
    pub rule: Rule,
}

/// How a rule set's independent results combine into one verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    AllOf,
    AnyOf,
    /// Strictly more than half of the rules.
    Majority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet {
    pub rules: Vec<NamedRule>,
    pub combine: Combine,
}

impl RuleSet {
    pub fn new(rules: Vec<NamedRule>, combine: Combine) -> Self {
        RuleSet { rules, combine }
    }

    pub fn empty() -> Self {
        RuleSet {
            rules: Vec::new(),
            combine: Combine::AllOf,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Indicator kinds referenced anywhere in the set, deduplicated,
    /// in first-reference order.
    pub fn referenced_indicators(&self) -> Vec<IndicatorKind> {
        let mut kinds = Vec::new();
        let mut push = |operand: &Operand| {
            if let Operand::Indicator(ind_ref) = operand {
                if !kinds.contains(&ind_ref.kind) {
                    kinds.push(ind_ref.kind);
                }
            }
        };
        for named in &self.rules {
            match &named.rule {
                Rule::Above { left, right }
                | Rule::Below { left, right }
                | Rule::CrossAbove { left, right }
                | Rule::CrossBelow { left, right } => {
                    push(left);
                    push(right);
                }
                Rule::Between { operand, .. } => push(operand),
            }
        }
        kinds
    }

    /// Bars of history before every referenced indicator is defined.
    /// Crossovers add one bar.
    pub fn required_history(&self) -> usize {
        let mut needed = 0usize;
        for named in &self.rules {
            let cross_extra = matches!(
                named.rule,
                Rule::CrossAbove { .. } | Rule::CrossBelow { .. }
            ) as usize;
            let operands: [&Operand; 2] = match &named.rule {
                Rule::Above { left, right }
                | Rule::Below { left, right }
                | Rule::CrossAbove { left, right }
                | Rule::CrossBelow { left, right } => [left, right],
                Rule::Between { operand, .. } => [operand, operand],
            };
            for operand in operands {
                if let Operand::Indicator(ind_ref) = operand {
                    needed = needed.max(ind_ref.kind.lookback() + 1 + cross_extra);
                }
            }
            needed = needed.max(1 + cross_extra);
        }
        needed
    }

    /// Structural validation run at strategy-load time.
    pub fn validate(&self) -> Result<(), TradecastError> {
        for named in &self.rules {
            if named.name.trim().is_empty() {
                return Err(TradecastError::RuleInvalid {
                    reason: "rule with empty name".into(),
                });
            }
            if let Rule::Between { lower, upper, .. } = named.rule {
                if lower > upper {
                    return Err(TradecastError::RuleInvalid {
                        reason: format!(
                            "'{}': between bounds inverted ({} > {})",
                            named.name, lower, upper
                        ),
                    });
                }
            }
            for operand in rule_operands(&named.rule) {
                if let Operand::Indicator(ind_ref) = operand {
                    validate_indicator_ref(&named.name, ind_ref)?;
                }
            }
        }
        Ok(())
    }
}

fn rule_operands(rule: &Rule) -> Vec<&Operand> {
    match rule {
        Rule::Above { left, right }
        | Rule::Below { left, right }
        | Rule::CrossAbove { left, right }
        | Rule::CrossBelow { left, right } => vec![left, right],
        Rule::Between { operand, .. } => vec![operand],
    }
}

fn validate_indicator_ref(rule_name: &str, ind_ref: &IndicatorRef) -> Result<(), TradecastError> {
    let period_ok = match ind_ref.kind {
        IndicatorKind::Sma(n)
        | IndicatorKind::Ema(n)
        | IndicatorKind::Rsi(n)
        | IndicatorKind::Atr(n)
        | IndicatorKind::Stddev(n) => n > 0,
        IndicatorKind::Vwap => true,
        IndicatorKind::Macd { fast, slow, signal } => fast > 0 && slow > 0 && signal > 0,
        IndicatorKind::Bollinger { period, .. } => period > 0,
    };
    if !period_ok {
        return Err(TradecastError::RuleInvalid {
            reason: format!("'{}': zero indicator period", rule_name),
        });
    }

    let field_ok = match ind_ref.kind {
        IndicatorKind::Macd { .. } => matches!(
            ind_ref.field,
            IndicatorField::MacdLine | IndicatorField::MacdSignal | IndicatorField::MacdHistogram
        ),
        IndicatorKind::Bollinger { .. } => matches!(
            ind_ref.field,
            IndicatorField::BollingerUpper
                | IndicatorField::BollingerMiddle
                | IndicatorField::BollingerLower
        ),
        _ => ind_ref.field == IndicatorField::Value,
    };
    if !field_ok {
        return Err(TradecastError::RuleInvalid {
            reason: format!(
                "'{}': field {:?} does not match indicator {}",
                rule_name, ind_ref.field, ind_ref.kind
            ),
        });
    }
    Ok(())
}
