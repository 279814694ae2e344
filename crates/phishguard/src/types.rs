//! Core data types for predictions, reports, and errors.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Binary class assigned to a URL or feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Legitimate,
    Phishing,
}

impl Verdict {
    /// Map a classifier class index (0 = legitimate, 1 = phishing).
    pub fn from_class(class: i64) -> Self {
        if class == 1 {
            Verdict::Phishing
        } else {
            Verdict::Legitimate
        }
    }

    /// Human-readable label used in tables and terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Legitimate => "Legitimate",
            Verdict::Phishing => "Phishing",
        }
    }

    pub fn is_phishing(self) -> bool {
        self == Verdict::Phishing
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Class probabilities as returned by the classifier.
///
/// The pair is reported exactly as the model produced it; it is never
/// clipped or renormalised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub legitimate: f64,
    pub phishing: f64,
}

impl ClassProbabilities {
    pub fn new(legitimate: f64, phishing: f64) -> Self {
        Self {
            legitimate,
            phishing,
        }
    }

    /// Build from a single phishing probability, assigning the remainder to
    /// the legitimate class.
    pub fn from_phishing(phishing: f64) -> Self {
        Self {
            legitimate: 1.0 - phishing,
            phishing,
        }
    }

    pub fn phishing_percent(&self) -> f64 {
        self.phishing * 100.0
    }

    pub fn legitimate_percent(&self) -> f64 {
        self.legitimate * 100.0
    }

    /// Class with the highest probability. Ties go to the legitimate class.
    pub fn argmax(&self) -> Verdict {
        if self.phishing > self.legitimate {
            Verdict::Phishing
        } else {
            Verdict::Legitimate
        }
    }
}

/// Prediction for one feature row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub verdict: Verdict,
    pub probabilities: ClassProbabilities,
}

impl Prediction {
    /// Phishing confidence formatted to two decimal places, e.g. `"87.50"`.
    pub fn phishing_confidence(&self) -> String {
        format!("{:.2}", self.probabilities.phishing_percent())
    }
}

/// Full result of classifying a single URL.
#[derive(Debug, Clone, Serialize)]
pub struct UrlReport {
    pub url: String,
    pub prediction: Prediction,
    pub features: FeatureVector,
}

/// Errors that can occur in the phishing detection library.
#[derive(thiserror::Error, Debug)]
pub enum PhishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Missing required feature columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Convenience result type.
pub type PhishResult<T> = Result<T, PhishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_class() {
        assert_eq!(Verdict::from_class(1), Verdict::Phishing);
        assert_eq!(Verdict::from_class(0), Verdict::Legitimate);
        assert_eq!(Verdict::from_class(-1), Verdict::Legitimate);
    }

    #[test]
    fn test_argmax_tie_is_legitimate() {
        let probs = ClassProbabilities::new(0.5, 0.5);
        assert_eq!(probs.argmax(), Verdict::Legitimate);
        assert_eq!(ClassProbabilities::new(0.2, 0.8).argmax(), Verdict::Phishing);
    }

    #[test]
    fn test_phishing_confidence_format() {
        let pred = Prediction {
            verdict: Verdict::Phishing,
            probabilities: ClassProbabilities::new(0.125, 0.875),
        };
        assert_eq!(pred.phishing_confidence(), "87.50");
    }

    #[test]
    fn test_missing_columns_message() {
        let err = PhishError::MissingColumns(vec!["ip".into(), "nb_dots".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required feature columns: ip, nb_dots"
        );
    }
}
