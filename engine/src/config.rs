//! Engine configuration.
//!
//! Values come from `Default`, optionally overridden by a TOML file:
//!
//! ```toml
//! width = 16
//! height = 16
//! fill_percent = 50.0
//! history_capacity = 20
//! max_cycles = 20
//! auto_restart = true
//! max_generations = 500
//! tick_delay_secs = 0.1
//! reseed_on_extinction = false
//! seed = 42
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::history::DEFAULT_CAPACITY;

/// Largest accepted grid side.
pub const MAX_DIMENSION: usize = 4096;
/// Longest accepted inter-tick delay.
pub const MAX_TICK_DELAY_SECS: f64 = 3600.0;

/// Upper bound on generations before a universe is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationCap {
    Unlimited,
    Limit(u64),
}

impl GenerationCap {
    /// True when a universe at `generation` has lived long enough.
    pub fn reached(self, generation: u64) -> bool {
        match self {
            GenerationCap::Unlimited => false,
            GenerationCap::Limit(cap) => generation >= cap,
        }
    }
}

impl From<Option<u64>> for GenerationCap {
    fn from(value: Option<u64>) -> Self {
        value.map_or(GenerationCap::Unlimited, GenerationCap::Limit)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Percentage of interior cells drawn alive on a random genesis.
    pub fill_percent: f64,
    pub history_capacity: usize,
    /// Repeat detections tolerated before acting; 0 never acts.
    pub max_cycles: u32,
    /// Reseed on a settled universe instead of pausing.
    pub auto_restart: bool,
    /// `None` lets a universe run forever.
    pub max_generations: Option<u64>,
    pub tick_delay_secs: f64,
    pub reseed_on_extinction: bool,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            fill_percent: 50.0,
            history_capacity: DEFAULT_CAPACITY,
            max_cycles: 20,
            auto_restart: false,
            max_generations: None,
            tick_delay_secs: 0.25,
            reseed_on_extinction: false,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(EngineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.history_capacity == 0 {
            return Err(EngineError::ZeroHistoryCapacity);
        }
        if !(0.0..=100.0).contains(&self.fill_percent) {
            return Err(EngineError::InvalidConfig(format!(
                "fill_percent must be in [0, 100], got {}",
                self.fill_percent
            )));
        }
        if !self.tick_delay_secs.is_finite() || !(0.0..=MAX_TICK_DELAY_SECS).contains(&self.tick_delay_secs) {
            return Err(EngineError::InvalidConfig(format!(
                "tick_delay_secs must be in [0, {MAX_TICK_DELAY_SECS}], got {}",
                self.tick_delay_secs
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content).map_err(|err| EngineError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| EngineError::InvalidConfig(format!("{}: {err}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn generation_cap(&self) -> GenerationCap {
        self.max_generations.into()
    }

    pub fn tick_delay(&self) -> Duration {
        Duration::from_secs_f64(self.tick_delay_secs)
    }
}
