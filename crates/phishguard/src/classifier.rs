//! Binary classifiers consuming scaled feature matrices.
//!
//! Two artifact formats are accepted:
//!
//! - `.onnx`: a model exported from the training pipeline and run through
//!   ONNX Runtime. The first output holds the `i64` class labels and the
//!   second the `[N, 2]` class probabilities (`zipmap` disabled). A model
//!   with a single output is read as probabilities only.
//! - `.json`: a logistic regression,
//!   `{ "kind": "logistic_regression", "coef": [..87], "intercept": f }`.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};

use crate::features::FEATURE_COUNT;
use crate::types::{ClassProbabilities, PhishError, PhishResult, Prediction, Verdict};

/// A fitted binary classifier. Class 0 is legitimate, class 1 is phishing.
pub trait Classifier: Send + Sync {
    /// Short description for logs and `info` output.
    fn describe(&self) -> String;

    /// Class probabilities for every row of `matrix`.
    fn predict_proba(&self, matrix: &Array2<f32>) -> PhishResult<Vec<ClassProbabilities>>;

    /// Class label for every row of `matrix`.
    fn predict(&self, matrix: &Array2<f32>) -> PhishResult<Vec<Verdict>> {
        Ok(self
            .predict_proba(matrix)?
            .iter()
            .map(ClassProbabilities::argmax)
            .collect())
    }

    /// Labels and probabilities together.
    fn classify(&self, matrix: &Array2<f32>) -> PhishResult<Vec<Prediction>> {
        let probabilities = self.predict_proba(matrix)?;
        let verdicts = self.predict(matrix)?;
        Ok(verdicts
            .into_iter()
            .zip(probabilities)
            .map(|(verdict, probabilities)| Prediction {
                verdict,
                probabilities,
            })
            .collect())
    }
}

fn check_width(matrix: &Array2<f32>) -> PhishResult<()> {
    if matrix.ncols() != FEATURE_COUNT {
        return Err(PhishError::DimensionMismatch {
            expected: FEATURE_COUNT,
            actual: matrix.ncols(),
        });
    }
    Ok(())
}

/// Load a classifier, choosing the format by file extension.
pub fn load_classifier(path: &Path) -> PhishResult<Box<dyn Classifier>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => Ok(Box::new(OnnxClassifier::from_file(path)?)),
        Some("json") => Ok(Box::new(LinearClassifier::from_file(path)?)),
        _ => Err(PhishError::Artifact(format!(
            "Unsupported classifier format: {} (expected .onnx or .json)",
            path.display()
        ))),
    }
}

// ── Logistic regression ─────────────────────────────────────────────────────

/// Logistic regression over the scaled feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "logistic_regression")]
pub struct LinearClassifier {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LinearClassifier {
    pub fn new(coef: Vec<f64>, intercept: f64) -> PhishResult<Self> {
        let model = Self { coef, intercept };
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> PhishResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            PhishError::Artifact(format!("Failed to read classifier {}: {e}", path.display()))
        })?;
        let model = Self::from_json(&data)?;
        tracing::info!("Loaded logistic regression from {}", path.display());
        Ok(model)
    }

    pub fn from_json(data: &[u8]) -> PhishResult<Self> {
        let model: LinearClassifier = serde_json::from_slice(data)
            .map_err(|e| PhishError::Artifact(format!("Invalid classifier artifact: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> PhishResult<()> {
        if self.coef.len() != FEATURE_COUNT {
            return Err(PhishError::Artifact(format!(
                "Classifier has {} coefficients, expected {FEATURE_COUNT}",
                self.coef.len()
            )));
        }
        Ok(())
    }
}

impl Classifier for LinearClassifier {
    fn describe(&self) -> String {
        "logistic regression (json)".to_string()
    }

    fn predict_proba(&self, matrix: &Array2<f32>) -> PhishResult<Vec<ClassProbabilities>> {
        check_width(matrix)?;
        Ok(matrix
            .rows()
            .into_iter()
            .map(|row| {
                let z: f64 = row
                    .iter()
                    .zip(self.coef.iter())
                    .map(|(&x, &w)| x as f64 * w)
                    .sum::<f64>()
                    + self.intercept;
                ClassProbabilities::from_phishing(sigmoid(z))
            })
            .collect())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

// ── ONNX Runtime ────────────────────────────────────────────────────────────

/// Classifier backed by an ONNX model.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    source: String,
}

struct OnnxOutput {
    labels: Option<Vec<i64>>,
    probabilities: Vec<ClassProbabilities>,
}

impl OnnxClassifier {
    /// Load an ONNX model. A missing or unreadable model is an error.
    pub fn from_file(path: &Path) -> PhishResult<Self> {
        if !path.exists() {
            return Err(PhishError::Artifact(format!(
                "Classifier model not found at {}",
                path.display()
            )));
        }

        tracing::info!("Loading ONNX classifier from {}", path.display());

        let session = Session::builder()
            .and_then(|b| Ok(b.with_intra_threads(1)?))
            .and_then(|mut b| b.commit_from_file(path))
            .map_err(|e| PhishError::Artifact(format!("Failed to load ONNX model: {e}")))?;

        tracing::info!("ONNX classifier loaded successfully");
        Ok(Self {
            session: Mutex::new(session),
            source: path.display().to_string(),
        })
    }

    fn run(&self, matrix: &Array2<f32>) -> PhishResult<OnnxOutput> {
        check_width(matrix)?;
        let rows = matrix.nrows();

        let input_tensor = Tensor::from_array(matrix.clone())
            .map_err(|e| PhishError::Inference(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PhishError::Inference("ONNX session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PhishError::Inference(format!("ONNX inference failed: {e}")))?;

        let (labels, proba_index) = if outputs.len() > 1 {
            let (_shape, data) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| PhishError::Inference(format!("Failed to extract labels: {e}")))?;
            (Some(data.to_vec()), 1)
        } else {
            (None, 0)
        };

        let (_shape, data) = outputs[proba_index]
            .try_extract_tensor::<f32>()
            .map_err(|e| PhishError::Inference(format!("Failed to extract probabilities: {e}")))?;

        if data.len() != rows * 2 {
            return Err(PhishError::DimensionMismatch {
                expected: rows * 2,
                actual: data.len(),
            });
        }
        if let Some(labels) = &labels {
            if labels.len() != rows {
                return Err(PhishError::DimensionMismatch {
                    expected: rows,
                    actual: labels.len(),
                });
            }
        }

        let probabilities = data
            .chunks_exact(2)
            .map(|pair| ClassProbabilities::new(pair[0] as f64, pair[1] as f64))
            .collect();

        Ok(OnnxOutput {
            labels,
            probabilities,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn describe(&self) -> String {
        format!("onnx ({})", self.source)
    }

    fn predict_proba(&self, matrix: &Array2<f32>) -> PhishResult<Vec<ClassProbabilities>> {
        Ok(self.run(matrix)?.probabilities)
    }

    fn predict(&self, matrix: &Array2<f32>) -> PhishResult<Vec<Verdict>> {
        Ok(self.classify(matrix)?.into_iter().map(|p| p.verdict).collect())
    }

    fn classify(&self, matrix: &Array2<f32>) -> PhishResult<Vec<Prediction>> {
        let output = self.run(matrix)?;
        let predictions = match output.labels {
            Some(labels) => labels
                .into_iter()
                .zip(output.probabilities)
                .map(|(label, probabilities)| Prediction {
                    verdict: Verdict::from_class(label),
                    probabilities,
                })
                .collect(),
            None => output
                .probabilities
                .into_iter()
                .map(|probabilities| Prediction {
                    verdict: probabilities.argmax(),
                    probabilities,
                })
                .collect(),
        };
        Ok(predictions)
    }
}
