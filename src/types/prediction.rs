//! Prediction and health-check result structures

use serde::{Deserialize, Serialize};

/// Discrete classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Fraudulent")]
    Fraudulent,
    #[serde(rename = "Non-Fraudulent")]
    NonFraudulent,
}

impl Label {
    /// Map the model's raw class id to a label. Only `1` is fraudulent.
    pub fn from_prediction(value: i64) -> Self {
        if value == 1 {
            Label::Fraudulent
        } else {
            Label::NonFraudulent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fraudulent => "Fraudulent",
            Label::NonFraudulent => "Non-Fraudulent",
        }
    }
}

/// Probability per label, serialized keyed by label name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    #[serde(rename = "Non-Fraudulent")]
    pub non_fraudulent: f64,
    #[serde(rename = "Fraudulent")]
    pub fraudulent: f64,
}

impl Probabilities {
    /// Build from a model row ordered (non-fraud, fraud).
    pub fn from_row([p0, p1]: [f64; 2]) -> Self {
        Self {
            non_fraudulent: p0,
            fraudulent: p1,
        }
    }

    pub fn total(&self) -> f64 {
        self.non_fraudulent + self.fraudulent
    }
}

/// Outcome of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Label derived from `raw_prediction_value`
    #[serde(rename = "result")]
    pub label: Label,

    /// Class id reported by the model
    #[serde(rename = "prediction_value")]
    pub raw_prediction_value: i64,

    /// Full probability distribution reported by the model
    pub probabilities: Probabilities,
}

/// Outcome of a health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub ok: bool,
    /// Raw prediction for the check input on success, error description otherwise
    pub detail: String,
}

impl HealthStatus {
    pub fn healthy(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_prediction() {
        assert_eq!(Label::from_prediction(1), Label::Fraudulent);
        assert_eq!(Label::from_prediction(0), Label::NonFraudulent);
        assert_eq!(Label::from_prediction(2), Label::NonFraudulent);
    }

    #[test]
    fn test_prediction_result_wire_format() {
        let result = PredictionResult {
            label: Label::Fraudulent,
            raw_prediction_value: 1,
            probabilities: Probabilities::from_row([0.25, 0.75]),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "result": "Fraudulent",
                "prediction_value": 1,
                "probabilities": {"Non-Fraudulent": 0.25, "Fraudulent": 0.75}
            })
        );
    }
}
