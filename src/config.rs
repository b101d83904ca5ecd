//! Simulation configuration.
//!
//! Every field has a default matching the reference behaviour, so a partial
//! JSON file only needs to name what it overrides:
//!
//! ```json
//! {
//!   "width": 1024.0,
//!   "height": 768.0,
//!   "initial_particles": 300,
//!   "collision_mode": "snapshot",
//!   "seed": 42
//! }
//! ```

use crate::core::entropy::MAX_GRID;
use crate::core::system::validate_speeds;
use crate::core::CollisionMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Tunable parameters for a [`crate::core::Simulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial surface width in surface units (pixels for a canvas).
    pub width: f64,
    /// Initial surface height.
    pub height: f64,
    /// Disc radius shared by every particle.
    pub radius: f64,
    /// Particles placed at random when the simulation is created.
    pub initial_particles: usize,
    /// Speed range `[min, max]` for randomly placed particles.
    pub fast_speed: (f64, f64),
    /// Per-component velocity bound for spawned particles.
    pub spawn_speed: f64,
    /// Particles added per spawn burst while a pointer is held.
    pub spawn_burst: usize,
    /// Delay between bursts of a held spawn, in milliseconds.
    pub spawn_repeat_ms: u64,
    /// Hard limit on particle count; `None` lets the system grow without bound.
    pub max_particles: Option<usize>,
    /// Side length `G` of the `G x G` occupancy grid.
    pub grid_size: usize,
    /// Number of entropy samples retained.
    pub history_capacity: usize,
    /// Minimum wall-clock gap between entropy samples, in milliseconds.
    pub sample_interval_ms: u64,
    pub collision_mode: CollisionMode,
    /// RNG seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            radius: 4.0,
            initial_particles: 200,
            fast_speed: (2.0, 4.0),
            spawn_speed: 1.0,
            spawn_burst: 3,
            spawn_repeat_ms: 50,
            max_particles: Some(2000),
            grid_size: 32,
            history_capacity: 600,
            sample_interval_ms: 100,
            collision_mode: CollisionMode::Sequential,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check parameter ranges.
    ///
    /// Errors: `Error::InvalidParam` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(Error::InvalidParam("width and height must be finite".into()));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        validate_speeds(self.fast_speed, self.spawn_speed)?;
        if self.spawn_repeat_ms == 0 {
            return Err(Error::InvalidParam("spawn_repeat_ms must be > 0".into()));
        }
        if self.grid_size == 0 || self.grid_size > MAX_GRID {
            return Err(Error::InvalidParam(format!("grid_size must be in 1..={MAX_GRID}")));
        }
        if self.history_capacity == 0 {
            return Err(Error::InvalidParam("history_capacity must be > 0".into()));
        }
        if let Some(cap) = self.max_particles {
            if cap < self.initial_particles {
                return Err(Error::InvalidParam(format!(
                    "max_particles ({cap}) is below initial_particles ({})",
                    self.initial_particles
                )));
            }
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn spawn_repeat(&self) -> Duration {
        Duration::from_millis(self.spawn_repeat_ms)
    }
}
