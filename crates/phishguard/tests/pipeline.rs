//! End-to-end tests: artifacts on disk → extraction → scaling → classification.

use std::path::{Path, PathBuf};

use serde_json::json;

use phishguard::features::{FEAT_IP, FEAT_NB_DOTS, FEAT_SHORTENING_SERVICE};
use phishguard::{
    Detector, FeatureTable, PhishError, Verdict, FEATURE_COUNT, FEATURE_NAMES,
};

// ─────────────────────── helpers ───────────────────────

/// Write a standard scaler and a logistic regression that leans on the
/// `ip` and `shortening_service` flags.
fn write_artifacts(dir: &Path) -> (PathBuf, PathBuf) {
    let mut mean = vec![0.0; FEATURE_COUNT];
    let mut scale = vec![1.0; FEATURE_COUNT];
    mean[FEAT_NB_DOTS] = 2.0;
    scale[FEAT_NB_DOTS] = 2.0;

    let scaler = json!({
        "kind": "standard",
        "mean": mean,
        "scale": scale,
        "feature_names": FEATURE_NAMES.to_vec(),
    });

    let mut coef = vec![0.0; FEATURE_COUNT];
    coef[FEAT_IP] = 4.0;
    coef[FEAT_SHORTENING_SERVICE] = 3.0;
    coef[FEAT_NB_DOTS] = 0.5;
    let model = json!({
        "kind": "logistic_regression",
        "coef": coef,
        "intercept": -2.0,
    });

    let scaler_path = dir.join("phishing_scaler.json");
    let model_path = dir.join("phishing_model.json");
    std::fs::write(&scaler_path, serde_json::to_vec_pretty(&scaler).unwrap()).unwrap();
    std::fs::write(&model_path, serde_json::to_vec_pretty(&model).unwrap()).unwrap();
    (model_path, scaler_path)
}

fn load_detector(dir: &tempfile::TempDir) -> Detector {
    let (model, scaler) = write_artifacts(dir.path());
    Detector::load(&model, &scaler).unwrap()
}

fn header_line() -> String {
    let mut headers: Vec<&str> = FEATURE_NAMES.to_vec();
    headers.insert(0, "url");
    headers.push("status");
    headers.join(",")
}

fn row_line(url: &str, ip: u8, shortener: u8, status: &str) -> String {
    let mut cells = vec![url.to_string()];
    for name in FEATURE_NAMES {
        let value = match name {
            "ip" => ip.to_string(),
            "shortening_service" => shortener.to_string(),
            "nb_dots" => "2".to_string(),
            _ => "0".to_string(),
        };
        cells.push(value);
    }
    cells.push(status.to_string());
    cells.join(",")
}

// ─────────────────────── single URL ───────────────────────

#[test]
fn test_single_url_is_deterministic_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let first = load_detector(&dir).classify_url("https://example.com").unwrap();
    let second = load_detector(&dir).classify_url("https://example.com").unwrap();

    assert_eq!(first.prediction, second.prediction);
    assert_eq!(first.prediction.verdict, Verdict::Legitimate);
    let p = first.prediction.probabilities;
    assert!((p.legitimate + p.phishing - 1.0).abs() < 1e-9);
}

#[test]
fn test_single_url_flags_ip_and_shortener() {
    let dir = tempfile::tempdir().unwrap();
    let detector = load_detector(&dir);

    let ip = detector.classify_url("http://192.168.1.1/login").unwrap();
    assert_eq!(ip.prediction.verdict, Verdict::Phishing);

    let short = detector.classify_url("https://bit.ly/xyz").unwrap();
    assert_eq!(short.prediction.verdict, Verdict::Phishing);
    assert!(short.prediction.probabilities.phishing_percent() > 50.0);
}

#[test]
fn test_report_serializes_feature_table() {
    let dir = tempfile::tempdir().unwrap();
    let report = load_detector(&dir).classify_url("https://a.b.c.com/x").unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["url"], "https://a.b.c.com/x");
    assert_eq!(value["prediction"]["verdict"], "legitimate");
    let features = value["features"].as_object().unwrap();
    assert_eq!(features.len(), FEATURE_COUNT);
    assert_eq!(features["nb_dots"], 3.0);
}

// ─────────────────────── artifacts ───────────────────────

#[test]
fn test_reordered_scaler_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let (model, scaler_path) = write_artifacts(dir.path());

    let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
    names.swap(2, 3);
    let scaler = json!({
        "kind": "standard",
        "mean": vec![0.0; FEATURE_COUNT],
        "scale": vec![1.0; FEATURE_COUNT],
        "feature_names": names,
    });
    std::fs::write(&scaler_path, serde_json::to_vec(&scaler).unwrap()).unwrap();

    let err = Detector::load(&model, &scaler_path).err().unwrap();
    assert!(matches!(err, PhishError::Artifact(_)));
}

#[test]
fn test_corrupt_model_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let (model, scaler) = write_artifacts(dir.path());
    std::fs::write(&model, b"\x80\x04\x95 not json").unwrap();

    let err = Detector::load(&model, &scaler).err().unwrap();
    assert!(err.to_string().contains("Invalid classifier artifact"));
}

// ─────────────────────── batch ───────────────────────

#[test]
fn test_batch_appends_predictions_in_row_order() {
    let dir = tempfile::tempdir().unwrap();
    let detector = load_detector(&dir);

    let csv = [
        header_line(),
        row_line("http://10.0.0.1/", 1, 0, "phishing"),
        row_line("https://example.com/", 0, 0, "legitimate"),
        row_line("https://bit.ly/a", 0, 1, "phishing"),
    ]
    .join("\n");
    let input = dir.path().join("input.csv");
    std::fs::write(&input, csv).unwrap();

    let mut table = FeatureTable::from_path(&input).unwrap();
    let predictions = detector.classify_table(&mut table).unwrap();
    let verdicts: Vec<Verdict> = predictions.iter().map(|p| p.verdict).collect();
    assert_eq!(
        verdicts,
        vec![Verdict::Phishing, Verdict::Legitimate, Verdict::Phishing]
    );

    let output = dir.path().join("out").join("phishing_predictions.csv");
    table.write_to_path(&output).unwrap();
    let written = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(!lines[0].contains("status"));
    assert!(lines[0].ends_with("Prediction,Confidence_Phishing_%"));
    assert!(lines[1].starts_with("http://10.0.0.1/,"));
    assert!(lines[2].contains(",Legitimate,"));

    let confidence = lines[1].rsplit(',').next().unwrap();
    assert_eq!(confidence.split('.').nth(1).map(str::len), Some(2));
}

#[test]
fn test_batch_missing_column_produces_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let detector = load_detector(&dir);

    let headers: Vec<&str> = FEATURE_NAMES.iter().copied().filter(|n| *n != "ip").collect();
    let row: Vec<&str> = headers.iter().map(|_| "0").collect();
    let csv = format!("{}\n{}\n", headers.join(","), row.join(","));

    let mut table = FeatureTable::from_reader(csv.as_bytes()).unwrap();
    let before = table.clone();
    match detector.classify_table(&mut table) {
        Err(PhishError::MissingColumns(missing)) => assert_eq!(missing, vec!["ip".to_string()]),
        other => panic!("expected MissingColumns, got {other:?}"),
    }
    assert_eq!(table, before);
}

#[test]
fn test_batch_url_extraction_matches_feature_table() {
    let dir = tempfile::tempdir().unwrap();
    let detector = load_detector(&dir);

    let url = "http://192.168.1.1/login";
    let report = detector.classify_url(url).unwrap();

    let header = FEATURE_NAMES.join(",");
    let row: Vec<String> = report.features.iter().map(|(_, v)| v.to_string()).collect();
    let csv = format!("{header}\n{}\n", row.join(","));
    let mut table = FeatureTable::from_reader(csv.as_bytes()).unwrap();
    let batch = detector.classify_table(&mut table).unwrap();

    assert_eq!(batch[0], report.prediction);
}
