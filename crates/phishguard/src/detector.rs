//! Scaler + classifier pipeline.

use std::path::Path;

use crate::batch::FeatureTable;
use crate::classifier::{load_classifier, Classifier};
use crate::extract::extract_features;
use crate::features::FeatureVector;
use crate::scaler::Scaler;
use crate::types::{PhishError, PhishResult, Prediction, UrlReport};

/// Tolerance for the sum-to-one check on probability pairs.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-3;

/// Loaded inference artifacts. Immutable once constructed.
pub struct Detector {
    scaler: Scaler,
    classifier: Box<dyn Classifier>,
}

impl Detector {
    pub fn new(scaler: Scaler, classifier: Box<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }

    /// Load both artifacts. Failure to load either one is fatal.
    pub fn load(model_path: &Path, scaler_path: &Path) -> PhishResult<Self> {
        let scaler = Scaler::from_file(scaler_path)?;
        let classifier = load_classifier(model_path)?;
        tracing::info!("Detector ready: {}", classifier.describe());
        Ok(Self::new(scaler, classifier))
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Classify feature rows. Output order matches input order.
    pub fn classify_rows(&self, rows: &[FeatureVector]) -> PhishResult<Vec<Prediction>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = self.scaler.transform(rows);
        let predictions = self.classifier.classify(&matrix)?;
        if predictions.len() != rows.len() {
            return Err(PhishError::DimensionMismatch {
                expected: rows.len(),
                actual: predictions.len(),
            });
        }

        for (i, p) in predictions.iter().enumerate() {
            let sum = p.probabilities.legitimate + p.probabilities.phishing;
            if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
                tracing::warn!("Row {i}: class probabilities sum to {sum:.4}, reporting as-is");
            }
        }

        tracing::debug!("Classified {} rows", rows.len());
        Ok(predictions)
    }

    /// Extract features from a URL and classify it.
    pub fn classify_url(&self, url: &str) -> PhishResult<UrlReport> {
        let features = extract_features(url);
        let prediction = self
            .classify_rows(std::slice::from_ref(&features))?
            .into_iter()
            .next()
            .ok_or_else(|| PhishError::Inference("Classifier returned no prediction".to_string()))?;

        tracing::info!(
            "{url}: {} ({:.2}% phishing)",
            prediction.verdict,
            prediction.probabilities.phishing_percent()
        );

        Ok(UrlReport {
            url: url.to_string(),
            prediction,
            features,
        })
    }

    /// Classify every row of a table and append the prediction columns.
    ///
    /// Schema errors leave the table untouched.
    pub fn classify_table(&self, table: &mut FeatureTable) -> PhishResult<Vec<Prediction>> {
        let rows = table.feature_rows()?;
        let predictions = self.classify_rows(&rows)?;
        table.append_predictions(&predictions)?;
        Ok(predictions)
    }
}
