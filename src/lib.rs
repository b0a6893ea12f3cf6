//! Message Fraud Detector Library
//!
//! Serves fraudulent / non-fraudulent predictions for text messages over HTTP,
//! backed by a pre-trained classification pipeline exported to ONNX.

pub mod artifact;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use artifact::ArtifactStore;
pub use config::AppConfig;
pub use error::{InferenceError, StartupError, ValidationError};
pub use models::{HealthMonitor, InferenceService, ModelProvider, TextClassifier};
pub use types::{HealthStatus, Label, Message, PredictionResult};
