//! Signal blending.
//!
//! Combines the rule evaluator's verdict with an optional statistical
//! prediction into a confidence score, a win probability and an expected
//! return. All arithmetic is deterministic; a missing prediction degrades
//! to rule strength plus the strategy's historical base rate.

use crate::domain::rule_eval::RuleSetOutcome;
use crate::domain::strategy::Strategy;
use serde::Serialize;

/// Prior win probability when a strategy carries no base rate.
pub const DEFAULT_PRIOR: f64 = 0.5;

/// Confidence below which a forecast with no fired rules is invalid.
pub const CONFIDENCE_FLOOR: f64 = 40.0;

/// Output of the external prediction model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Probability-like score in [0, 1].
    pub probability: f64,
    /// Estimated move magnitude, percent.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub rule: f64,
    pub ml: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        BlendWeights { rule: 0.5, ml: 0.5 }
    }
}

impl BlendWeights {
    /// Weighted average of a rule-side and an ML-side value, normalized so
    /// the weights need not sum to one.
    fn combine(&self, rule_value: f64, ml_value: f64) -> f64 {
        let total = self.rule + self.ml;
        if total <= 0.0 {
            return (rule_value + ml_value) / 2.0;
        }
        (self.rule * rule_value + self.ml * ml_value) / total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlendedSignal {
    /// Clamped to [0, 100].
    pub confidence: f64,
    /// Clamped to [0, 1].
    pub win_probability: f64,
    /// Percent of capital required.
    pub expected_return_pct: f64,
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

pub fn blend(
    outcome: &RuleSetOutcome,
    prediction: Option<Prediction>,
    strategy: &Strategy,
    weights: BlendWeights,
) -> BlendedSignal {
    let rule_score = clamp01(outcome.strength);
    let base_rate = strategy.success_rate.unwrap_or(DEFAULT_PRIOR);
    let base_return = strategy.avg_return_pct.unwrap_or(0.0);

    let (score, win_probability, raw_return) = match prediction {
        Some(p) => {
            let ml_score = clamp01(p.probability);
            (
                weights.combine(rule_score, ml_score),
                clamp01(weights.combine(base_rate, ml_score)),
                weights.combine(base_return, p.magnitude),
            )
        }
        None => (rule_score, clamp01(base_rate), base_return),
    };

    let confidence = (score * 100.0).clamp(0.0, 100.0);

    BlendedSignal {
        confidence,
        win_probability,
        expected_return_pct: raw_return * (confidence / 100.0),
    }
}
