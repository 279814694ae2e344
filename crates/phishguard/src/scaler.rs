//! Fitted feature scaler loaded from a JSON artifact.
//!
//! Two transforms are supported, matching the scalers the training pipeline
//! exports:
//!
//! ```json
//! { "kind": "standard", "mean": [..87], "scale": [..87] }
//! { "kind": "min_max",  "min":  [..87], "scale": [..87] }
//! ```
//!
//! An optional `feature_names` array pins the column order the scaler was
//! fitted on; when present it must equal [`FEATURE_NAMES`] exactly.

use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::{PhishError, PhishResult};

/// The fitted transform parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerKind {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

/// A scaler artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    #[serde(flatten)]
    pub kind: ScalerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl Scaler {
    /// Scaler that passes values through unchanged.
    pub fn identity() -> Self {
        Self {
            kind: ScalerKind::Standard {
                mean: vec![0.0; FEATURE_COUNT],
                scale: vec![1.0; FEATURE_COUNT],
            },
            feature_names: None,
        }
    }

    /// Load and validate a scaler from a JSON file.
    pub fn from_file(path: &Path) -> PhishResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            PhishError::Artifact(format!("Failed to read scaler {}: {e}", path.display()))
        })?;
        let scaler = Self::from_json(&data)?;
        tracing::info!("Loaded scaler from {}", path.display());
        Ok(scaler)
    }

    /// Parse and validate a scaler from JSON bytes.
    pub fn from_json(data: &[u8]) -> PhishResult<Self> {
        let scaler: Scaler = serde_json::from_slice(data)
            .map_err(|e| PhishError::Artifact(format!("Invalid scaler artifact: {e}")))?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> PhishResult<()> {
        let (a, b) = match &self.kind {
            ScalerKind::Standard { mean, scale } => (mean, scale),
            ScalerKind::MinMax { min, scale } => (min, scale),
        };
        for params in [a, b] {
            if params.len() != FEATURE_COUNT {
                return Err(PhishError::Artifact(format!(
                    "Scaler has {} parameters, expected {FEATURE_COUNT}",
                    params.len()
                )));
            }
        }

        if let Some(names) = &self.feature_names {
            if names.len() != FEATURE_COUNT {
                return Err(PhishError::Artifact(format!(
                    "Scaler was fitted on {} features, expected {FEATURE_COUNT}",
                    names.len()
                )));
            }
            if let Some((pos, (got, want))) = names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .enumerate()
                .find(|(_, (got, want))| got.as_str() != **want)
            {
                return Err(PhishError::Artifact(format!(
                    "Scaler feature order differs at column {pos}: '{got}' where '{want}' was expected"
                )));
            }
        }
        Ok(())
    }

    /// Scale a single value of column `col`.
    fn apply(&self, col: usize, x: f64) -> f64 {
        match &self.kind {
            ScalerKind::Standard { mean, scale } => {
                let s = if scale[col] == 0.0 { 1.0 } else { scale[col] };
                (x - mean[col]) / s
            }
            ScalerKind::MinMax { min, scale } => x * scale[col] + min[col],
        }
    }

    /// Transform rows into an `[n_rows, 87]` model input matrix.
    pub fn transform(&self, rows: &[FeatureVector]) -> Array2<f32> {
        let mut matrix = Array2::<f32>::zeros((rows.len(), FEATURE_COUNT));
        for (r, row) in rows.iter().enumerate() {
            for (c, &x) in row.as_slice().iter().enumerate() {
                matrix[[r, c]] = self.apply(c, x) as f32;
            }
        }
        matrix
    }
}
