//! Prediction model port trait.
//!
//! The model is an opaque collaborator: it sees the feature vector and
//! may decline to answer. `None` degrades the blend to rule strength
//! plus the strategy base rate; it never fails a forecast.

use crate::domain::forecast::FeatureVector;
use crate::domain::signal::Prediction;

pub trait PredictorPort {
    fn predict(&self, features: &FeatureVector) -> Option<Prediction>;
}
