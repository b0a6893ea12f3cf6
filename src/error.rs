//! Error types for the fraud detection service.
//!
//! Failures travel on two separate channels:
//! - [`StartupError`] is fatal. It is returned from artifact resolution and model
//!   loading and stops the process before the HTTP listener is bound.
//! - [`ValidationError`] and [`InferenceError`] are per-request. They are turned into
//!   JSON error responses and never affect other requests.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failure while bringing the model online.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "model artifact not found at {} and no remote source is configured",
        .path.display()
    )]
    ArtifactMissing { path: PathBuf },

    #[error("failed to fetch model artifact from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write model artifact to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load model from {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("model at {} does not satisfy the classifier contract: {reason}", .path.display())]
    Contract { path: PathBuf, reason: String },
}

/// Caller supplied no usable input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No message provided")]
    EmptyMessage,
}

/// Failure while invoking the loaded model on a well-formed message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("model invocation failed: {0}")]
    Runtime(String),

    #[error("unexpected model output: {0}")]
    MalformedOutput(String),

    #[error("invalid probability distribution [{p0}, {p1}]")]
    InvalidDistribution { p0: f64, p1: f64 },
}

impl InferenceError {
    pub(crate) fn runtime(err: impl std::fmt::Display) -> Self {
        InferenceError::Runtime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_matches_api_contract() {
        assert_eq!(ValidationError::EmptyMessage.to_string(), "No message provided");
    }

    #[test]
    fn test_startup_error_mentions_path() {
        let err = StartupError::ArtifactMissing {
            path: PathBuf::from("models/fraud_pipeline.onnx"),
        };
        assert!(err.to_string().contains("models/fraud_pipeline.onnx"));
    }
}
