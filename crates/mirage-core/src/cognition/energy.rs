//! Energy State Machine
//!
//! Energy is an integer budget spent by moving and observing and restored by
//! waiting. The band it falls in tightens the agent's thresholds and, at the
//! bottom, overrides whatever the agent intended.

use serde::{Deserialize, Serialize};

use mirage_types::Action;

use crate::config::EnergyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyBand {
    /// At or above the low threshold
    Normal,
    /// Between the critical and low thresholds: paranoia and caution shrink
    Low,
    /// Below the critical threshold: every action collapses to WAIT
    Critical,
}

impl EnergyBand {
    pub fn classify(energy: i32, config: &EnergyConfig) -> Self {
        if energy < config.critical_energy_threshold {
            EnergyBand::Critical
        } else if energy < config.low_energy_threshold {
            EnergyBand::Low
        } else {
            EnergyBand::Normal
        }
    }

    /// True for both `Low` and `Critical`.
    pub fn is_fatigued(self) -> bool {
        !matches!(self, EnergyBand::Normal)
    }
}

/// Signed energy change for performing `action`.
pub fn energy_delta(action: Action, config: &EnergyConfig) -> i32 {
    match action {
        Action::MoveN | Action::MoveS | Action::MoveE | Action::MoveW => -config.move_energy_cost,
        Action::Observe => -config.observe_energy_cost,
        Action::Wait => config.wait_energy_restore,
        Action::Gather | Action::Attack | Action::Hide => 0,
    }
}

/// Clamp into `[min_energy, max_energy]`.
pub fn clamp_energy(energy: i32, config: &EnergyConfig) -> i32 {
    energy.clamp(config.min_energy, config.max_energy)
}

/// Energy after performing `action`, clamped.
pub fn spend(energy: i32, action: Action, config: &EnergyConfig) -> i32 {
    clamp_energy(energy.saturating_add(energy_delta(action, config)), config)
}
