//! Single-message inference over the shared model

use crate::error::InferenceError;
use crate::models::classifier::TextClassifier;
use crate::types::{Label, Message, PredictionResult, Probabilities};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Maximum distance of a probability row's sum from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Classifies one message at a time against the process-wide model.
pub struct InferenceService {
    model: Arc<dyn TextClassifier>,
}

impl InferenceService {
    pub fn new(model: Arc<dyn TextClassifier>) -> Self {
        Self { model }
    }

    /// Classify `message`.
    ///
    /// The label comes from the model's discrete prediction alone. When it
    /// disagrees with the probability row, the discrete prediction is reported
    /// as is and the probabilities are passed through unchanged.
    pub fn predict(&self, message: &Message) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();
        let batch = [message.as_str()];

        let raw_prediction_value = single(self.model.classify(&batch)?, "label")?;
        let row = single(self.model.score_distribution(&batch)?, "probability row")?;
        let probabilities = check_distribution(row)?;

        let label = Label::from_prediction(raw_prediction_value);

        debug!(
            label = label.as_str(),
            prediction_value = raw_prediction_value,
            fraud_probability = probabilities.fraudulent,
            latency_us = start.elapsed().as_micros() as u64,
            "Prediction complete"
        );

        Ok(PredictionResult {
            label,
            raw_prediction_value,
            probabilities,
        })
    }
}

/// Take the only element of a single-input batch result.
pub(crate) fn single<T>(values: Vec<T>, what: &str) -> Result<T, InferenceError> {
    let count = values.len();
    let mut values = values.into_iter();
    match (values.next(), count) {
        (Some(value), 1) => Ok(value),
        _ => Err(InferenceError::MalformedOutput(format!(
            "expected 1 {} for a single message, got {}",
            what, count
        ))),
    }
}

fn check_distribution([p0, p1]: [f64; 2]) -> Result<Probabilities, InferenceError> {
    let in_range = |p: f64| (0.0..=1.0).contains(&p);
    if !in_range(p0) || !in_range(p1) || ((p0 + p1) - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(InferenceError::InvalidDistribution { p0, p1 });
    }
    Ok(Probabilities::from_row([p0, p1]))
}
