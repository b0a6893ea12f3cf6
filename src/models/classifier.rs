//! Capability contract every loaded model must satisfy

use crate::error::InferenceError;

/// A trained text classifier with two read-only capabilities.
///
/// Implementations are shared across concurrent requests for the process
/// lifetime and must not change their outputs between calls.
pub trait TextClassifier: Send + Sync {
    /// Predict a class id for every text in `batch`, in order.
    fn classify(&self, batch: &[&str]) -> Result<Vec<i64>, InferenceError>;

    /// Predict a probability row per text, ordered (non-fraud, fraud).
    fn score_distribution(&self, batch: &[&str]) -> Result<Vec<[f64; 2]>, InferenceError>;
}
