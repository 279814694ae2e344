//! PhishGuard CLI entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use phishguard::batch::DEFAULT_OUTPUT_FILE;
use phishguard::features::URL_DERIVED_FEATURES;
use phishguard::{
    extract_features, Detector, FeatureTable, FEATURE_COUNT, FEATURE_NAMES,
    UNAVAILABLE_WITHOUT_PAGE_FETCH,
};
use phishguard_cli::config::{resolve_model_path, resolve_scaler_path};
use phishguard_cli::render;

#[derive(Parser)]
#[command(
    name = "phishguard",
    about = "Classify URLs as phishing or legitimate with a pretrained model",
    version
)]
struct Cli {
    /// Path to the classifier artifact (.onnx or .json).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Path to the scaler artifact (.json).
    #[arg(long, global = true)]
    scaler: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single URL.
    Check {
        /// URL to analyse. Need not be well-formed.
        url: String,

        /// Also print the extracted feature table.
        #[arg(long)]
        features: bool,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the feature vector of a URL without running the model.
    Features {
        /// URL to analyse.
        url: String,

        /// Print as a JSON object.
        #[arg(long)]
        json: bool,
    },

    /// Classify every row of a CSV feature table.
    Batch {
        /// Input CSV containing all model feature columns.
        input: PathBuf,

        /// Output CSV with prediction columns appended.
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,
    },

    /// Print feature layout and resolved artifact paths as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   phishguard completions bash > ~/.local/share/bash-completion/completions/phishguard
    ///   phishguard completions zsh > ~/.zfunc/_phishguard
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_detector(model: Option<&str>, scaler: Option<&str>) -> anyhow::Result<Detector> {
    let model_path = resolve_model_path(model);
    let scaler_path = resolve_scaler_path(scaler);
    tracing::debug!(
        "Artifacts: model={}, scaler={}",
        model_path.display(),
        scaler_path.display()
    );
    Detector::load(&model_path, &scaler_path).context("Failed to load model artifacts")
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let model = cli.model.as_deref();
    let scaler = cli.scaler.as_deref();

    match cli.command {
        Commands::Check {
            url,
            features,
            json,
        } => {
            let detector = load_detector(model, scaler)?;
            let report = detector.classify_url(&url)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::report_text(&report, features));
            }
        }

        Commands::Features { url, json } => {
            let features = extract_features(&url);
            if json {
                println!("{}", serde_json::to_string_pretty(&features)?);
            } else {
                print!("{}", render::feature_table(&features));
            }
        }

        Commands::Batch { input, output } => {
            let detector = load_detector(model, scaler)?;
            let mut table = FeatureTable::from_path(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let predictions = detector
                .classify_table(&mut table)
                .with_context(|| format!("Failed to process {}", input.display()))?;
            table
                .write_to_path(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            let phishing = predictions.iter().filter(|p| p.verdict.is_phishing()).count();
            println!(
                "Prediction complete: {} rows ({phishing} phishing, {} legitimate)",
                predictions.len(),
                predictions.len() - phishing
            );
            println!("Wrote {}", output.display());
        }

        Commands::Info => {
            let model_path = resolve_model_path(model);
            let scaler_path = resolve_scaler_path(scaler);
            let info = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "feature_count": FEATURE_COUNT,
                "features": FEATURE_NAMES.to_vec(),
                "url_derived": URL_DERIVED_FEATURES
                    .iter()
                    .map(|&idx| FEATURE_NAMES[idx])
                    .collect::<Vec<_>>(),
                "unavailable_without_page_fetch": UNAVAILABLE_WITHOUT_PAGE_FETCH.to_vec(),
                "model": {
                    "path": model_path.display().to_string(),
                    "exists": model_path.exists(),
                },
                "scaler": {
                    "path": scaler_path.display().to_string(),
                    "exists": scaler_path.exists(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "phishguard", &mut std::io::stdout());
        }

        Commands::Repl => {
            phishguard_cli::repl::run(model, scaler)?;
        }
    }

    Ok(())
}
