//! Fit one smoothing model per security district and write the JSON
//! artifacts the forecast endpoint reads. Run this whenever the security
//! CSV changes; the service itself never refits.

use anyhow::Result;
use dashmetrics::{
    config::Config,
    data,
    forecast::{ModelStore, SmoothingModel},
    security,
};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Daily observations with weekly seasonality.
const DEFAULT_SEASON_LENGTH: usize = 7;
const DEFAULT_ALPHA: f64 = 0.35;
const DEFAULT_BETA: f64 = 0.05;
const DEFAULT_GAMMA: f64 = 0.15;

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let config = Config::from_env();
    let season_length = env::var("SEASON_LENGTH")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SEASON_LENGTH);
    let alpha = env_f64("SMOOTH_ALPHA", DEFAULT_ALPHA);
    let beta = env_f64("SMOOTH_BETA", DEFAULT_BETA);
    let gamma = env_f64("SMOOTH_GAMMA", DEFAULT_GAMMA);

    let dataset = data::load_dataset(&config.data_dir)?;
    let store = ModelStore::new(&config.models_dir);

    let mut trained = 0usize;
    let mut skipped = 0usize;
    for (district, series) in security::incident_series(&dataset) {
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        match SmoothingModel::fit(&district, &values, season_length, alpha, beta, gamma) {
            Ok(model) => {
                let path = store.save(&model)?;
                info!(
                    district = %district,
                    observations = values.len(),
                    "wrote {}",
                    path.display()
                );
                trained += 1;
            }
            Err(e) => {
                warn!(district = %district, "not trained: {}", e);
                skipped += 1;
            }
        }
    }

    info!(trained, skipped, "done");
    Ok(())
}
