//! Tunable simulation parameters
//!
//! Defaults come from the constants in `types`; a TOML file may override any
//! subset of them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{
    ADVISORY_TIMEOUT_MS, BASE_STATION_CAPACITY, EVENT_CHECK_INTERVAL_MS, PASSENGER_SPAWN_RATE,
    TRAIN_CAPACITY, TRAIN_SPEED,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Progress per tick of a train with no speed modifier
    pub train_speed: f32,
    /// Base spawn probability per station per tick
    pub passenger_spawn_rate: f32,
    /// Waiting-passenger cap for a station served by fewer than two lines
    pub base_station_capacity: usize,
    pub train_capacity: usize,
    pub event_check_interval_ms: u64,
    pub advisory_timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            train_speed: TRAIN_SPEED,
            passenger_spawn_rate: PASSENGER_SPAWN_RATE,
            base_station_capacity: BASE_STATION_CAPACITY,
            train_capacity: TRAIN_CAPACITY,
            event_check_interval_ms: EVENT_CHECK_INTERVAL_MS,
            advisory_timeout_ms: ADVISORY_TIMEOUT_MS,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content).context("Invalid simulation config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if !(self.train_speed.is_finite() && self.train_speed > 0.0) {
            anyhow::bail!("train_speed must be a positive number");
        }
        if !(self.passenger_spawn_rate.is_finite() && self.passenger_spawn_rate >= 0.0) {
            anyhow::bail!("passenger_spawn_rate must be a non-negative number");
        }
        if self.train_capacity == 0 {
            anyhow::bail!("train_capacity must be at least 1");
        }
        Ok(())
    }
}
