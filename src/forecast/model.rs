use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Additive Holt-Winters (triple exponential smoothing) state for one
/// district, persisted as a JSON artifact by the trainer and read back
/// lazily by the forecast endpoint. The service only projects; it never
/// refits at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingModel {
    pub district: String,
    /// Seasonal period in observations; daily incident data uses 7.
    pub season_length: usize,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Smoothed level after the last observation.
    pub level: f64,
    /// Smoothed trend after the last observation.
    pub trend: f64,
    /// Seasonal components indexed by observation position mod
    /// `season_length`.
    pub seasonals: Vec<f64>,
    /// Number of observations the fit consumed; fixes the seasonal phase
    /// for projection.
    pub n_obs: usize,
}

impl SmoothingModel {
    /// Fit from an observed series. Needs at least two full seasons: the
    /// first initializes level and seasonals, the second the trend.
    pub fn fit(
        district: &str,
        series: &[f64],
        season_length: usize,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        ensure!(season_length >= 1, "season_length must be at least 1");
        ensure!(
            series.len() >= 2 * season_length,
            "district {} has {} observations, need at least {}",
            district,
            series.len(),
            2 * season_length
        );

        let m = season_length;
        let first_avg: f64 = series[..m].iter().sum::<f64>() / m as f64;
        let second_avg: f64 = series[m..2 * m].iter().sum::<f64>() / m as f64;

        let mut level = first_avg;
        let mut trend = (second_avg - first_avg) / m as f64;
        let mut seasonals: Vec<f64> = series[..m].iter().map(|y| y - first_avg).collect();

        for (t, &y) in series.iter().enumerate().skip(m) {
            let idx = t % m;
            let last_level = level;
            level = alpha * (y - seasonals[idx]) + (1.0 - alpha) * (level + trend);
            trend = beta * (level - last_level) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * seasonals[idx];
        }

        Ok(Self {
            district: district.to_string(),
            season_length,
            alpha,
            beta,
            gamma,
            level,
            trend,
            seasonals,
            n_obs: series.len(),
        })
    }

    /// Reject artifacts that would make projection meaningless: a zero
    /// season, a seasonal vector of the wrong length, or non-finite
    /// state. Corrupt files on disk surface here after deserializing.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.season_length >= 1, "season_length must be at least 1");
        ensure!(
            self.seasonals.len() == self.season_length,
            "seasonal vector has {} entries, expected {}",
            self.seasonals.len(),
            self.season_length
        );
        ensure!(
            self.level.is_finite()
                && self.trend.is_finite()
                && self.seasonals.iter().all(|s| s.is_finite()),
            "model state is not finite"
        );
        Ok(())
    }

    /// Project `horizon` steps past the last observation. Step `i`
    /// continues the trend line and reuses the seasonal component of the
    /// matching phase.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|i| {
                let idx = (self.n_obs + i - 1) % self.season_length;
                self.level + i as f64 * self.trend + self.seasonals[idx]
            })
            .collect()
    }
}
