//! Per-district forecast lookup: resolve a pre-trained smoothing model
//! artifact, project it past the last observed date, and pair it with
//! the actual series. Districts without a readable model are left out of
//! the result set rather than failing the request.

mod model;

pub use model::SmoothingModel;

use anyhow::{Context, Result};
use chrono::Duration;
use glob::glob;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::data::Dataset;
use crate::security::{incident_series, SeriesPoint};
use crate::util::round2;

/// District name as it appears in the artifact filename: lowercase,
/// spaces and path separators flattened to underscores.
fn sanitize_district(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Resolves per-district model artifacts beneath a fixed directory.
/// Artifacts are read lazily per request; nothing is cached or mutated.
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, district: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_district(district)))
    }

    /// `Ok(None)` when no artifact exists for the district; `Err` when
    /// one exists but cannot be read, parsed, or validated.
    pub fn load(&self, district: &str) -> Result<Option<SmoothingModel>> {
        let path = self.artifact_path(district);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        let model: SmoothingModel = serde_json::from_str(&text)
            .with_context(|| format!("parsing model artifact {}", path.display()))?;
        model
            .validate()
            .with_context(|| format!("validating model artifact {}", path.display()))?;
        Ok(Some(model))
    }

    /// Write a trained model to its artifact path, creating the
    /// directory if needed. Used by the trainer, never by the service.
    pub fn save(&self, model: &SmoothingModel) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating model directory {}", self.dir.display()))?;
        let path = self.artifact_path(&model.district);
        let text = serde_json::to_string_pretty(model).context("serializing model")?;
        fs::write(&path, text)
            .with_context(|| format!("writing model artifact {}", path.display()))?;
        Ok(path)
    }

    /// All artifact files currently on disk.
    pub fn list_artifacts(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!("{}/*.json", self.dir.display());
        let mut paths = Vec::new();
        for entry in glob(&pattern)? {
            paths.push(entry?);
        }
        paths.sort();
        Ok(paths)
    }
}

#[derive(Debug, Serialize)]
pub struct DistrictForecast {
    pub district: String,
    pub actual: Vec<SeriesPoint>,
    pub forecast: Vec<SeriesPoint>,
}

/// Build the actual-plus-forecast pair for every district that has a
/// usable model. The projection starts the day after the last observed
/// date; values are rounded to 2 decimals. Districts with no artifact
/// are skipped silently, districts with a corrupt one are logged and
/// skipped — the request as a whole still succeeds.
pub fn district_forecasts(
    data: &Dataset,
    store: &ModelStore,
    horizon: usize,
) -> Vec<DistrictForecast> {
    let mut results = Vec::new();
    for (district, actual) in incident_series(data) {
        let model = match store.load(&district) {
            Ok(Some(model)) => model,
            Ok(None) => {
                debug!(district = %district, "no model artifact, skipping");
                continue;
            }
            Err(e) => {
                warn!(district = %district, "unusable model artifact, skipping: {:#}", e);
                continue;
            }
        };

        let Some(last) = actual.last() else {
            continue;
        };
        let forecast = model
            .forecast(horizon)
            .into_iter()
            .enumerate()
            .map(|(i, value)| SeriesPoint {
                date: last.date + Duration::days(i as i64 + 1),
                value: round2(value),
            })
            .collect();

        results.push(DistrictForecast {
            district,
            actual,
            forecast,
        });
    }
    results
}
