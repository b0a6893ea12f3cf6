//! ONNX model loader

use crate::error::{InferenceError, StartupError};
use crate::models::classifier::TextClassifier;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::tensor::TensorElementType;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor, ValueType};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Text classification pipeline exported to ONNX.
///
/// The graph takes one string tensor `[batch, 1]` and produces an int64 label
/// output plus a probability output, either a float tensor `[batch, 2]` or a
/// `seq(map(int64, float))` as written by ZipMap exports.
pub struct OnnxTextClassifier {
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Input name for the text tensor
    input_name: String,
    /// Output name for class ids
    label_output: String,
    /// Output name for class probabilities
    probability_output: String,
}

impl OnnxTextClassifier {
    /// Load the artifact and validate the classifier contract.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self, StartupError> {
        let path = path.as_ref();
        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(path, e))?
            .with_intra_threads(onnx_threads)
            .map_err(|e| load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        let contract = |reason: String| StartupError::Contract {
            path: path.to_path_buf(),
            reason,
        };

        let input = match session.inputs.as_slice() {
            [input] => input,
            inputs => return Err(contract(format!("expected 1 input, found {}", inputs.len()))),
        };
        if !matches!(
            input.input_type,
            ValueType::Tensor {
                ty: TensorElementType::String,
                ..
            }
        ) {
            return Err(contract(format!(
                "input '{}' is not a string tensor ({:?})",
                input.name, input.input_type
            )));
        }

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone())
            .ok_or_else(|| contract("no label output".to_string()))?;

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone())
            .ok_or_else(|| contract("no probability output".to_string()))?;

        info!(
            input = %input.name,
            label_output = %label_output,
            probability_output = %probability_output,
            "Model loaded successfully"
        );

        Ok(Self {
            input_name: input.name.clone(),
            session: Mutex::new(session),
            label_output,
            probability_output,
        })
    }

    /// Run the graph on a batch and hand the outputs to `extract`.
    fn run<T>(
        &self,
        batch: &[&str],
        extract: impl FnOnce(&SessionOutputs) -> Result<T, InferenceError>,
    ) -> Result<T, InferenceError> {
        let texts: Vec<String> = batch.iter().map(|t| t.to_string()).collect();
        let shape = vec![texts.len() as i64, 1];
        let input_tensor =
            Tensor::from_string_array((shape, &texts[..])).map_err(InferenceError::runtime)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::runtime(format!("Lock error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(InferenceError::runtime)?;

        extract(&outputs)
    }

    fn output<'a>(
        outputs: &'a SessionOutputs,
        name: &str,
    ) -> Result<&'a DynValue, InferenceError> {
        outputs
            .get(name)
            .ok_or_else(|| InferenceError::MalformedOutput(format!("missing output '{}'", name)))
    }

    /// Extract class probability rows from the probability output.
    /// Handles both tensor outputs and seq(map) outputs.
    fn extract_rows(output: &DynValue) -> Result<Vec<[f64; 2]>, InferenceError> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            if dims.len() != 2 || dims[1] != 2 {
                return Err(InferenceError::MalformedOutput(format!(
                    "probability tensor has shape {:?}, expected [batch, 2]",
                    dims
                )));
            }
            return Ok(data
                .chunks_exact(2)
                .map(|row| [row[0] as f64, row[1] as f64])
                .collect());
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return Self::extract_from_sequence_map(output);
        }

        Err(InferenceError::MalformedOutput(format!(
            "unsupported probability output type {:?}",
            dtype
        )))
    }

    /// Extract probability rows from seq(map(int64, float)) format
    fn extract_from_sequence_map(output: &DynValue) -> Result<Vec<[f64; 2]>, InferenceError> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(InferenceError::runtime)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(InferenceError::runtime)?;

        let mut rows = Vec::with_capacity(maps.len());
        for map_value in &maps {
            let kv_pairs = map_value
                .try_extract_key_values::<i64, f32>()
                .map_err(InferenceError::runtime)?;

            let class = |id: i64| {
                kv_pairs
                    .iter()
                    .find(|(class_id, _)| *class_id == id)
                    .map(|(_, prob)| *prob as f64)
            };

            match (class(0), class(1)) {
                (Some(p0), Some(p1)) => rows.push([p0, p1]),
                _ => {
                    return Err(InferenceError::MalformedOutput(format!(
                        "probability map must hold classes 0 and 1, got {:?}",
                        kv_pairs
                    )))
                }
            }
        }

        Ok(rows)
    }
}

impl TextClassifier for OnnxTextClassifier {
    fn classify(&self, batch: &[&str]) -> Result<Vec<i64>, InferenceError> {
        self.run(batch, |outputs| {
            let output = Self::output(outputs, &self.label_output)?;
            let (_, labels) = output
                .try_extract_tensor::<i64>()
                .map_err(InferenceError::runtime)?;
            debug!(labels = ?labels, "Extracted labels");
            Ok(labels.to_vec())
        })
    }

    fn score_distribution(&self, batch: &[&str]) -> Result<Vec<[f64; 2]>, InferenceError> {
        self.run(batch, |outputs| {
            let output = Self::output(outputs, &self.probability_output)?;
            Self::extract_rows(output)
        })
    }
}

fn load_error(path: &Path, err: impl std::fmt::Display) -> StartupError {
    StartupError::Load {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Owns the one validated model instance of the process.
pub struct ModelProvider {
    path: PathBuf,
    model: Arc<dyn TextClassifier>,
}

impl ModelProvider {
    /// Deserialize the artifact at `path`. Any failure is fatal to startup.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let model = OnnxTextClassifier::load(path, onnx_threads)?;
        Ok(Self {
            path: path.to_path_buf(),
            model: Arc::new(model),
        })
    }

    /// Wrap an already constructed classifier.
    pub fn from_model(path: impl Into<PathBuf>, model: Arc<dyn TextClassifier>) -> Self {
        Self {
            path: path.into(),
            model,
        }
    }

    /// Shared handle to the loaded model
    pub fn model(&self) -> Arc<dyn TextClassifier> {
        Arc::clone(&self.model)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
