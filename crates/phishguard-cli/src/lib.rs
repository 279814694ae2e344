//! PhishGuard command-line front end.

pub mod config;
pub mod render;
pub mod repl;

pub use config::{resolve_model_path, resolve_scaler_path};
