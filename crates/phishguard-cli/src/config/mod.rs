//! Artifact path resolution.
//!
//! Order: explicit flag, then `./models/`, then `~/.phishguard/models/`.
//! There is no environment-variable override.

use std::path::{Path, PathBuf};

const LOCAL_MODEL_DIR: &str = "models";
const HOME_MODEL_DIR: &str = ".phishguard/models";

/// Classifier file names probed in order.
const MODEL_FILENAMES: &[&str] = &["phishing_model.onnx", "phishing_model.json"];

const SCALER_FILENAMES: &[&str] = &["phishing_scaler.json"];

/// Resolve the classifier artifact path.
pub fn resolve_model_path(explicit: Option<&str>) -> PathBuf {
    resolve(explicit, MODEL_FILENAMES)
}

/// Resolve the scaler artifact path.
pub fn resolve_scaler_path(explicit: Option<&str>) -> PathBuf {
    resolve(explicit, SCALER_FILENAMES)
}

fn resolve(explicit: Option<&str>, filenames: &[&str]) -> PathBuf {
    resolve_in(
        explicit,
        Path::new(LOCAL_MODEL_DIR),
        &home_dir().join(HOME_MODEL_DIR),
        filenames,
    )
}

/// Resolution against explicit directories.
pub fn resolve_in(
    explicit: Option<&str>,
    local_dir: &Path,
    home_dir: &Path,
    filenames: &[&str],
) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    for dir in [local_dir, home_dir] {
        if let Some(found) = filenames
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.exists())
        {
            return found;
        }
    }

    // Nothing on disk; report the preferred home location so the error names it.
    home_dir.join(filenames.first().copied().unwrap_or_default())
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}
