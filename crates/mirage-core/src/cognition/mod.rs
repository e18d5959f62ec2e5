//! Cognition Pipeline
//!
//! The per-tick decision cycle shared by every agent kind, split into
//! phases so the orchestrator can put a barrier between them:
//!
//! 1. `perceive` - refresh memory from what is truthfully visible and build
//!    the observation the agent (or its player) acts on
//! 2. `emit` - broadcast current beliefs into the tick's registry
//! 3. `resolve` - contagion, conflict scarring, threshold adjustment, then the
//!    intent is filtered through caution and fatigue and paid for

mod energy;
mod policy;

pub use energy::{clamp_energy, energy_delta, spend, EnergyBand};
pub use policy::{parse_key, Intent, Policy};

use serde::{Deserialize, Serialize};

use mirage_types::{Action, AgentId, Observation, ObservationSource, Position, Tick};

use crate::config::Config;
use crate::contagion::{apply_belief_contagion, detect_and_apply_conflicts, BeliefRegistry};
use crate::memory::{Memory, PriorMap};
use crate::observation::{build_observation, hallucinated_positions};

/// Output of the perceive phase, carried into `resolve`.
#[derive(Debug, Clone, PartialEq)]
pub struct Perception {
    /// What each refreshed cell held before this tick's update
    pub prior: PriorMap,
    /// The pre-action observation handed to players
    pub observation: Observation,
}

/// Everything that went into one agent's action for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// What the policy asked for
    pub intended: Action,
    /// What the agent actually does
    pub action: Action,
    pub quit: bool,
    /// Cells adopted from other agents' signals
    pub transferred: Vec<Position>,
    /// Cells scarred by contradiction
    pub scarred: Vec<Position>,
    /// Band before paying for the action
    pub band: EnergyBand,
    /// Remembered cells imagined into view when deciding
    pub hallucinated: Vec<Position>,
}

/// Memory and energy of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Cognition {
    pub memory: Memory,
    pub energy: i32,
}

impl Cognition {
    pub fn new(energy: i32) -> Self {
        Self {
            memory: Memory::new(),
            energy,
        }
    }

    pub fn with_memory(memory: Memory, energy: i32) -> Self {
        Self { memory, energy }
    }

    pub fn band(&self, config: &Config) -> EnergyBand {
        EnergyBand::classify(self.energy, &config.energy)
    }

    /// Paranoia and caution cutoffs after the low-energy reduction.
    pub fn effective_thresholds(&self, config: &Config) -> (i64, i64) {
        let cognition = &config.cognition;
        if self.band(config).is_fatigued() {
            (
                cognition.paranoia_threshold - cognition.low_energy_paranoia_delta,
                cognition.caution_threshold - cognition.low_energy_caution_delta,
            )
        } else {
            (cognition.paranoia_threshold, cognition.caution_threshold)
        }
    }

    /// Refresh memory from the source and build the pre-action observation.
    pub fn perceive(&mut self, source: &ObservationSource, config: &Config) -> Perception {
        let prior = self.memory.update_from_visible(source);
        let (paranoia, _) = self.effective_thresholds(config);
        let observation =
            build_observation(&self.memory, source, &prior, self.energy, paranoia, config);
        Perception { prior, observation }
    }

    /// Broadcast every current belief from `position`.
    pub fn emit(&self, id: &AgentId, position: Position, tick: Tick, registry: &mut BeliefRegistry) {
        registry.emit(id, tick, position, self.memory.beliefs(tick));
    }

    /// Run the rest of the cycle and settle on an action.
    ///
    /// `position` is where the agent stood at the start of the tick; an
    /// unplaced agent skips contagion and caution. Does not move the agent.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &mut self,
        id: &AgentId,
        position: Option<Position>,
        tick: Tick,
        perception: &Perception,
        registry: &BeliefRegistry,
        intent: Intent,
        config: &Config,
    ) -> Decision {
        let transferred = match position {
            Some(position) => apply_belief_contagion(
                registry,
                id,
                position,
                tick,
                &mut self.memory,
                self.energy,
                config,
            ),
            None => Vec::new(),
        };
        let scarred = detect_and_apply_conflicts(&mut self.memory, &perception.prior, tick, config);

        let (paranoia, caution) = self.effective_thresholds(config);
        let hallucinated = hallucinated_positions(
            &self.memory,
            tick,
            &perception.prior,
            self.energy,
            paranoia,
            config,
        );
        if !hallucinated.is_empty() {
            tracing::debug!("{} hallucinates {} tile(s)", id, hallucinated.len());
        }

        let band = self.band(config);
        let mut action = intent.action;

        let destination = position.and_then(|p| action.target(p));
        if let Some(remembered) = destination.and_then(|d| self.memory.get(d)) {
            if remembered.age(tick) > caution {
                tracing::debug!(
                    "{} hesitates before {} (age {} > {}), observing",
                    id,
                    remembered.tile.position,
                    remembered.age(tick),
                    caution
                );
                action = Action::Observe;
            }
        }

        if band == EnergyBand::Critical {
            tracing::debug!("{} collapses at energy {}, waiting", id, self.energy);
            action = Action::Wait;
        }

        self.energy = spend(self.energy, action, &config.energy);

        if action == Action::Observe {
            let healed = self.memory.heal_scars();
            if healed > 0 {
                tracing::debug!("{} healed {} scarred tile(s)", id, healed);
            }
        }

        Decision {
            intended: intent.action,
            action,
            quit: intent.quit,
            transferred,
            scarred,
            band,
            hallucinated,
        }
    }
}
