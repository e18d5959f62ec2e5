//! Tick Orchestrator
//!
//! Drives the world and every agent through one tick at a time. Each tick
//! runs in strict phases:
//!
//! 1. Advance the marker
//! 2. Freeze a snapshot and cut every agent's observation source from it
//! 3. Perceive (remote players are sent their observation)
//! 4. Collect input, giving each remote player its own bounded wait
//! 5. Every agent emits its beliefs into a fresh registry
//! 6. Decide in list order, writing each resolved move back immediately
//!
//! The input wait is the only await point.

use thiserror::Error;
use tokio::time::{sleep, timeout_at, Instant};

use mirage_types::{AgentId, ObservationSource, Position, Tick};

use crate::agent::{Agent, AgentKind};
use crate::cognition::{clamp_energy, Decision, Perception};
use crate::config::{Config, ConfigError};
use crate::contagion::BeliefRegistry;
use crate::movement::resolve_movement;
use crate::world::World;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// What happened in one tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TickReport {
    pub tick: Tick,
    /// One entry per agent, in list order
    pub decisions: Vec<(AgentId, Decision)>,
    /// Marker position after this tick's advance
    pub marker: Position,
    /// A local player asked to end the session
    pub quit: bool,
}

impl TickReport {
    pub fn decision(&self, id: &AgentId) -> Option<&Decision> {
        self.decisions
            .iter()
            .find(|(agent, _)| agent == id)
            .map(|(_, decision)| decision)
    }
}

pub struct Orchestrator {
    config: Config,
    world: World,
    agents: Vec<Agent>,
    tick: Tick,
}

impl Orchestrator {
    /// Validate the config and place every agent.
    ///
    /// Agents without a spawn cell start at `(index, 0)`; every start is
    /// clamped into the grid.
    pub fn new(config: Config, agents: Vec<Agent>) -> Result<Self, SimError> {
        config.validate()?;
        let mut orchestrator = Self {
            world: World::from_config(&config.world),
            config,
            agents: Vec::with_capacity(agents.len()),
            tick: 0,
        };
        for agent in agents {
            orchestrator.add_agent(agent)?;
        }
        tracing::info!(
            "Orchestrator ready: {}x{} grid, {} agents",
            orchestrator.world.width(),
            orchestrator.world.height(),
            orchestrator.agents.len()
        );
        Ok(orchestrator)
    }

    /// Append an agent, placing and clamping it like `new` does.
    pub fn add_agent(&mut self, mut agent: Agent) -> Result<(), SimError> {
        if self.agent(agent.id()).is_some() {
            tracing::warn!("Rejecting duplicate agent {}", agent.id());
            return Err(SimError::DuplicateAgent(agent.id().clone()));
        }

        let index = i32::try_from(self.agents.len()).unwrap_or(i32::MAX);
        let requested = agent.spawn().unwrap_or(Position::new(index, 0));
        let start = Position::new(
            requested.x.clamp(0, self.world.width() - 1),
            requested.y.clamp(0, self.world.height() - 1),
        );
        agent.cognition.energy = clamp_energy(agent.cognition.energy, &self.config.energy);

        tracing::debug!("Placing {} ({:?}) at {}", agent.id(), agent.kind(), start);
        self.world.set_position(agent.id().clone(), start);
        self.agents.push(agent);
        Ok(())
    }

    /// Run one tick.
    pub async fn tick_once(&mut self) -> TickReport {
        let tick = self.tick;
        self.world.move_marker();

        let snapshot = self.world.clone();
        let radius = self.config.world.visibility_radius;
        let sources: Vec<ObservationSource> = self
            .agents
            .iter()
            .map(|agent| snapshot.observation_source(agent.id(), tick, radius))
            .collect();

        let mut perceptions: Vec<Perception> = Vec::with_capacity(self.agents.len());
        for (agent, source) in self.agents.iter_mut().zip(&sources) {
            let perception = agent.cognition.perceive(source, &self.config);
            if let AgentKind::RemoteHuman(endpoint) = agent.kind() {
                endpoint.publish(perception.observation.clone());
            }
            perceptions.push(perception);
        }

        let inputs = self.collect_inputs(&perceptions).await;

        let mut registry = BeliefRegistry::for_tick(tick);
        for (agent, source) in self.agents.iter().zip(&sources) {
            if let Some(position) = source.position {
                agent.cognition.emit(agent.id(), position, tick, &mut registry);
            }
        }

        let width = self.world.width();
        let height = self.world.height();
        let mut decisions = Vec::with_capacity(self.agents.len());
        let mut quit = false;
        for ((agent, source), (perception, input)) in self
            .agents
            .iter_mut()
            .zip(&sources)
            .zip(perceptions.iter().zip(&inputs))
        {
            let decision = agent.resolve(source, perception, &registry, input.as_deref(), &self.config);

            if let Some(position) = self.world.position_of(agent.id()) {
                let next = resolve_movement(position, decision.action, width, height);
                if next != position {
                    self.world.set_position(agent.id().clone(), next);
                }
            }

            quit |= decision.quit;
            decisions.push((agent.id().clone(), decision));
        }

        self.tick += 1;
        let marker = self.world.marker_position();
        tracing::info!(
            "Tick {} complete: {} decisions, marker at {}",
            tick,
            decisions.len(),
            marker
        );

        TickReport {
            tick,
            decisions,
            marker,
            quit,
        }
    }

    /// Ask every player for a key. NPCs get `None`.
    ///
    /// Each remote player gets the full input timeout, starting when its
    /// turn to answer comes up; a missing, late, or disconnected player waits.
    async fn collect_inputs(&mut self, perceptions: &[Perception]) -> Vec<Option<String>> {
        let timeout = self.config.runtime.input_timeout();
        let mut inputs = Vec::with_capacity(self.agents.len());

        for (agent, perception) in self.agents.iter_mut().zip(perceptions) {
            let id = agent.id().clone();
            let key = match agent.kind_mut() {
                AgentKind::Scripted | AgentKind::Oscillating => None,
                AgentKind::Human(source) => source.next_key(&perception.observation),
                AgentKind::RemoteHuman(endpoint) => {
                    let deadline = Instant::now() + timeout;
                    match timeout_at(deadline, endpoint.inputs().recv()).await {
                        Ok(Some(key)) => Some(key),
                        Ok(None) => {
                            tracing::warn!("{} disconnected, waiting", id);
                            None
                        }
                        Err(_) => {
                            tracing::warn!("{} sent no input in time, waiting", id);
                            None
                        }
                    }
                }
            };
            inputs.push(key);
        }

        inputs
    }

    /// Run up to `ticks` ticks, stopping early when a local player quits.
    pub async fn run(&mut self, ticks: u64) -> Vec<TickReport> {
        let interval = self.config.runtime.tick_interval();
        let mut reports = Vec::new();

        for i in 0..ticks {
            let report = self.tick_once().await;
            let quit = report.quit;
            reports.push(report);
            if quit {
                tracing::info!("Session ended by player at tick {}", self.tick);
                break;
            }
            if !interval.is_zero() && i + 1 < ticks {
                sleep(interval).await;
            }
        }

        reports
    }

    /// Next tick to run
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn position_of(&self, id: &AgentId) -> Option<Position> {
        self.world.position_of(id)
    }

    pub fn marker_position(&self) -> Position {
        self.world.marker_position()
    }
}
