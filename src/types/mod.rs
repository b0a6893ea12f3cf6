//! Type definitions for the fraud detection service

pub mod message;
pub mod prediction;

pub use message::Message;
pub use prediction::{HealthStatus, Label, PredictionResult, Probabilities};
