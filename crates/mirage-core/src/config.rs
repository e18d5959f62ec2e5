//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without recompiling.
//! Every section falls back to its defaults, so a file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use mirage_types::Position;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    pub energy: EnergyConfig,
    pub cognition: CognitionConfig,
    pub contagion: ContagionConfig,
    pub runtime: RuntimeConfig,
}

/// Grid and field-of-view parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: i32,
    pub height: i32,
    /// Chebyshev radius of each agent's field of view
    pub visibility_radius: i32,
    pub marker_start: Position,
}

/// Energy budget and per-action costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub max_energy: i32,
    pub min_energy: i32,
    pub low_energy_threshold: i32,
    pub critical_energy_threshold: i32,
    pub move_energy_cost: i32,
    pub observe_energy_cost: i32,
    pub wait_energy_restore: i32,
}

/// Age cutoffs for hallucination and hesitation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitionConfig {
    pub paranoia_threshold: i64,
    pub caution_threshold: i64,
    /// Paranoia reduction while energy is low
    pub low_energy_paranoia_delta: i64,
    /// Caution reduction while energy is low
    pub low_energy_caution_delta: i64,
    /// Extra per-tile paranoia reduction applied when building a fatigued observation
    pub fatigue_hallucination_delta: i64,
}

/// Belief transfer and contradiction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContagionConfig {
    /// Manhattan distance within which beliefs spread
    pub belief_radius: i32,
    /// Ticks subtracted from every transferred belief
    pub transfer_penalty: i64,
    pub conflict_threshold: i64,
    /// Minimum age forced onto a freshly scarred memory
    pub scar_penalty: i64,
}

/// Tick loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long each remote player is waited on per tick
    pub input_timeout_ms: u64,
    /// Pause between ticks in `Orchestrator::run` (0 = none)
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            energy: EnergyConfig::default(),
            cognition: CognitionConfig::default(),
            contagion: ContagionConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 25,
            visibility_radius: 2,
            marker_start: Position::new(0, 12),
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: 20,
            min_energy: 0,
            low_energy_threshold: 8,
            critical_energy_threshold: 3,
            move_energy_cost: 1,
            observe_energy_cost: 1,
            wait_energy_restore: 2,
        }
    }
}

impl Default for CognitionConfig {
    fn default() -> Self {
        Self {
            paranoia_threshold: 5,
            caution_threshold: 3,
            low_energy_paranoia_delta: 2,
            low_energy_caution_delta: 1,
            fatigue_hallucination_delta: 2,
        }
    }
}

impl Default for ContagionConfig {
    fn default() -> Self {
        Self {
            belief_radius: 1,
            transfer_penalty: 2,
            conflict_threshold: 3,
            scar_penalty: 3,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            input_timeout_ms: 5000,
            tick_interval_ms: 200,
        }
    }
}

impl RuntimeConfig {
    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    /// Render the configuration as a TOML document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject combinations the energy state machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.energy;
        if e.min_energy >= e.max_energy {
            return Err(ConfigError::Invalid(format!(
                "min_energy ({}) must be below max_energy ({})",
                e.min_energy, e.max_energy
            )));
        }
        if e.critical_energy_threshold >= e.low_energy_threshold {
            return Err(ConfigError::Invalid(format!(
                "critical_energy_threshold ({}) must be below low_energy_threshold ({})",
                e.critical_energy_threshold, e.low_energy_threshold
            )));
        }
        if self.world.width <= 0 || self.world.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "world must be non-empty, got {}x{}",
                self.world.width, self.world.height
            )));
        }
        if self.world.visibility_radius < 0 || self.contagion.belief_radius < 0 {
            return Err(ConfigError::Invalid("radii must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
