//! PhishGuard: URL feature extraction and phishing classification.

pub mod batch;
pub mod classifier;
pub mod detector;
pub mod extract;
pub mod features;
pub mod scaler;
pub mod types;
pub mod url_parts;

pub use batch::FeatureTable;
pub use classifier::{load_classifier, Classifier, LinearClassifier, OnnxClassifier};
pub use detector::Detector;
pub use extract::extract_features;
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES, UNAVAILABLE_WITHOUT_PAGE_FETCH};
pub use scaler::{Scaler, ScalerKind};
pub use types::*;
pub use url_parts::{DomainParts, UrlParts};
