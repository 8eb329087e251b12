use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, VisualizerError};

/// Highest accepted tick rate in Hz
pub const MAX_UPDATE_RATE: f32 = 1000.0;

/// Analysis parameters, fixed for the lifetime of a `Visualizer`.
///
/// Loaded from camelCase JSON; any missing field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// FFT window length in samples (power of two)
    pub fft_size: usize,
    /// Reserved for temporal smoothing of spectra, currently unused
    pub smoothing_constant: f32,
    /// Lower bound of the pitch/depth mapping in Hz
    pub min_frequency: f32,
    /// Upper bound of the pitch/depth mapping in Hz
    pub max_frequency: f32,
    /// Reserved band count for renderers, currently unused
    pub freq_bands: usize,
    /// Scheduler tick rate in Hz
    pub update_rate: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_constant: 0.8,
            min_frequency: 20.0,
            max_frequency: 20000.0,
            freq_bands: 32,
            update_rate: 60.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(VisualizerError::InvalidConfig(format!(
                "fftSize must be a power of two >= 32, got {}",
                self.fft_size
            )));
        }

        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            return Err(VisualizerError::InvalidConfig(format!(
                "frequency range must satisfy 0 < min < max, got {}..{}",
                self.min_frequency, self.max_frequency
            )));
        }

        if !(self.update_rate > 0.0 && self.update_rate <= MAX_UPDATE_RATE) {
            return Err(VisualizerError::InvalidConfig(format!(
                "updateRate must be in (0, {}], got {}",
                MAX_UPDATE_RATE, self.update_rate
            )));
        }

        if self.tick_period().is_none() {
            return Err(VisualizerError::InvalidConfig(format!(
                "updateRate {} does not give a usable tick period",
                self.update_rate
            )));
        }

        Ok(())
    }

    /// Load a config from a JSON file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Scheduler period derived from `update_rate`.
    ///
    /// Falls back to the default 60 Hz period for a config that would not pass `validate`.
    pub fn tick_interval(&self) -> Duration {
        self.tick_period()
            .unwrap_or_else(|| Duration::from_secs_f64(1.0 / Self::default().update_rate as f64))
    }

    // None when the period overflows or rounds to zero
    fn tick_period(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(1.0 / self.update_rate as f64)
            .ok()
            .filter(|period| !period.is_zero())
    }
}
