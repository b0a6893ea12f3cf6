//! Model loading and inference components

pub mod classifier;
pub mod health;
pub mod inference;
pub mod loader;

pub use classifier::TextClassifier;
pub use health::HealthMonitor;
pub use inference::InferenceService;
pub use loader::{ModelProvider, OnnxTextClassifier};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory classifiers standing in for a trained artifact.

    use super::TextClassifier;
    use crate::error::InferenceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCAM_MARKERS: [&str; 5] = ["congratulations", "won", "click here", "prize", "urgent"];

    /// Flags promotional scam language by keyword count.
    #[derive(Default)]
    pub struct KeywordModel {
        pub calls: AtomicUsize,
    }

    impl KeywordModel {
        fn fraud_probability(text: &str) -> f64 {
            let text = text.to_lowercase();
            let hits = SCAM_MARKERS.iter().filter(|m| text.contains(*m)).count();
            (0.1 + 0.3 * hits as f64).min(0.95)
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextClassifier for KeywordModel {
        fn classify(&self, batch: &[&str]) -> Result<Vec<i64>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(batch
                .iter()
                .map(|text| i64::from(Self::fraud_probability(text) >= 0.5))
                .collect())
        }

        fn score_distribution(&self, batch: &[&str]) -> Result<Vec<[f64; 2]>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(batch
                .iter()
                .map(|text| {
                    let p1 = Self::fraud_probability(text);
                    [1.0 - p1, p1]
                })
                .collect())
        }
    }

    /// Returns fixed outputs regardless of input.
    pub struct FixedModel {
        pub labels: Vec<i64>,
        pub rows: Vec<[f64; 2]>,
    }

    impl TextClassifier for FixedModel {
        fn classify(&self, _batch: &[&str]) -> Result<Vec<i64>, InferenceError> {
            Ok(self.labels.clone())
        }

        fn score_distribution(&self, _batch: &[&str]) -> Result<Vec<[f64; 2]>, InferenceError> {
            Ok(self.rows.clone())
        }
    }

    /// Fails every invocation.
    pub struct FailingModel;

    impl TextClassifier for FailingModel {
        fn classify(&self, _batch: &[&str]) -> Result<Vec<i64>, InferenceError> {
            Err(InferenceError::Runtime("session exploded".to_string()))
        }

        fn score_distribution(&self, _batch: &[&str]) -> Result<Vec<[f64; 2]>, InferenceError> {
            Err(InferenceError::Runtime("session exploded".to_string()))
        }
    }
}
