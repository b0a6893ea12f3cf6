//! Self-test for the loaded model

use crate::models::classifier::TextClassifier;
use crate::models::inference::single;
use crate::types::HealthStatus;
use std::sync::Arc;
use tracing::warn;

/// Fixed input used to exercise the model independent of caller input
pub const CHECK_INPUT: &str = "Health check";

/// Runs a fixed input through the label-prediction capability.
pub struct HealthMonitor {
    model: Arc<dyn TextClassifier>,
}

impl HealthMonitor {
    pub fn new(model: Arc<dyn TextClassifier>) -> Self {
        Self { model }
    }

    pub fn check(&self) -> HealthStatus {
        let prediction = self
            .model
            .classify(&[CHECK_INPUT])
            .and_then(|labels| single(labels, "label"));

        match prediction {
            Ok(value) => HealthStatus::healthy(value.to_string()),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthStatus::unhealthy(e.to_string())
            }
        }
    }
}
