//! Deterministic baseline prediction model.
//!
//! Scores the feature vector with fixed additive boosts: a neutral 0.5
//! prior nudged up by favorable momentum, balanced RSI, a volume surge,
//! a calm volatility regime and a clear trend. Missing features simply
//! contribute nothing. Magnitude is the 20-bar momentum expressed in
//! percent. The same features always produce the same prediction.

use crate::domain::forecast::FeatureVector;
use crate::domain::signal::Prediction;
use crate::ports::predictor_port::PredictorPort;

const PRIOR: f64 = 0.5;
const MOMENTUM_BOOST: f64 = 0.10;
const RSI_BOOST: f64 = 0.05;
const VOLUME_BOOST: f64 = 0.08;
const VOLATILITY_BOOST: f64 = 0.10;
const TREND_BOOST: f64 = 0.15;

#[derive(Debug, Default)]
pub struct BaselinePredictor;

impl BaselinePredictor {
    pub fn new() -> Self {
        Self
    }
}

fn feature(features: &FeatureVector, name: &str) -> Option<f64> {
    features.get(name).copied().flatten()
}

impl PredictorPort for BaselinePredictor {
    fn predict(&self, features: &FeatureVector) -> Option<Prediction> {
        let mut score = PRIOR;

        if feature(features, "price_momentum").is_some_and(|m| m > 0.02) {
            score += MOMENTUM_BOOST;
        }
        if feature(features, "rsi").is_some_and(|r| (40.0..=70.0).contains(&r)) {
            score += RSI_BOOST;
        }
        if feature(features, "volume_ratio").is_some_and(|v| v > 1.2) {
            score += VOLUME_BOOST;
        }
        if feature(features, "volatility").is_some_and(|v| v < 0.02) {
            score += VOLATILITY_BOOST;
        }
        if feature(features, "trend_strength").is_some_and(|t| t > 0.05) {
            score += TREND_BOOST;
        }

        Some(Prediction {
            probability: score.clamp(0.05, 0.95),
            magnitude: feature(features, "price_momentum").unwrap_or(0.0) * 100.0,
        })
    }
}
