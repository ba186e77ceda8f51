use std::env;
use std::path::PathBuf;

/// Runtime configuration, sourced from the environment with sensible
/// defaults so a plain `cargo run` next to a `data/` directory works.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP API binds to.
    pub port: u16,
    /// Directory holding the five input CSV files.
    pub data_dir: PathBuf,
    /// Directory holding per-district forecast model artifacts.
    pub models_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);
        let data_dir = env::var("DATA_DIR")
            .unwrap_or_else(|_| "data".to_string())
            .into();
        let models_dir = env::var("MODELS_DIR")
            .unwrap_or_else(|_| "models".to_string())
            .into();
        Self {
            port,
            data_dir,
            models_dir,
        }
    }
}
