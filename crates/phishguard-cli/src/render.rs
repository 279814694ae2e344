//! Terminal rendering of predictions and feature tables.

use std::fmt::Write;

use phishguard::{FeatureVector, Prediction, UrlReport};

/// Headline for a verdict.
pub fn verdict_line(prediction: &Prediction) -> String {
    if prediction.verdict.is_phishing() {
        "[!!] Phishing website detected".to_string()
    } else {
        "[OK] Legitimate website".to_string()
    }
}

/// Both class probabilities as percentages, two decimals each.
pub fn confidence_line(prediction: &Prediction) -> String {
    format!(
        "Model confidence: {:.2}% phishing | {:.2}% legitimate",
        prediction.probabilities.phishing_percent(),
        prediction.probabilities.legitimate_percent()
    )
}

/// Integers without decimals, everything else to four places.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

/// One `name  value` line per feature, in model input order.
pub fn feature_table(features: &FeatureVector) -> String {
    let mut out = String::new();
    for (name, value) in features.iter() {
        let _ = writeln!(out, "  {name:<28} {}", format_value(value));
    }
    out
}

/// Plain-text report for a classified URL.
pub fn report_text(report: &UrlReport, show_features: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "URL: {}", report.url);
    let _ = writeln!(out, "{}", verdict_line(&report.prediction));
    let _ = writeln!(out, "{}", confidence_line(&report.prediction));
    if show_features {
        let _ = writeln!(out);
        let _ = writeln!(out, "Extracted features:");
        out.push_str(&feature_table(&report.features));
    }
    out
}
