//! Agents
//!
//! An agent is an id, a kind (which decides where its intent comes from),
//! and the cognition state it owns. Player-driven kinds carry their input
//! plumbing: a local `InputSource`, or the agent side of a `RemoteLink`.

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;

use tokio::sync::{mpsc, watch};

use mirage_types::{AgentId, Observation, ObservationSource, Position};

use crate::cognition::{Cognition, Decision, Perception, Policy};
use crate::config::Config;
use crate::contagion::BeliefRegistry;
use crate::memory::Memory;

/// Where a local player's keys come from.
pub trait InputSource: Send {
    /// Next key for the tick the observation describes. `None` waits.
    fn next_key(&mut self, observation: &Observation) -> Option<String>;
}

/// Fixed queue of keys, one per tick; runs dry into `None`.
#[derive(Debug, Clone, Default)]
pub struct QueuedInput {
    keys: VecDeque<String>,
}

impl QueuedInput {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.keys.push_back(key.into());
    }
}

impl InputSource for QueuedInput {
    fn next_key(&mut self, _observation: &Observation) -> Option<String> {
        self.keys.pop_front()
    }
}

/// Reads one line from stdin per tick.
#[derive(Debug, Default)]
pub struct StdinInput;

impl InputSource for StdinInput {
    fn next_key(&mut self, observation: &Observation) -> Option<String> {
        println!(
            "[tick {}] {} visible, {} known > ",
            observation.tick,
            observation.visible.len(),
            observation.known.len()
        );
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

/// Player side of a remote agent.
///
/// Observations arrive as "latest wins"; keys go out through a one-slot
/// channel.
#[derive(Debug)]
pub struct RemoteLink {
    pub observations: watch::Receiver<Option<Observation>>,
    pub inputs: mpsc::Sender<String>,
}

impl RemoteLink {
    /// Most recent observation published, if any.
    pub fn latest_observation(&self) -> Option<Observation> {
        self.observations.borrow().clone()
    }

    /// Wait until a new observation is published.
    ///
    /// Returns false once the agent has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.observations.changed().await.is_ok()
    }

    /// Queue a key for the next input wait.
    ///
    /// Returns false if a key is already pending or the agent is gone; the
    /// key is dropped.
    pub fn send_key(&self, key: impl Into<String>) -> bool {
        self.inputs.try_send(key.into()).is_ok()
    }
}

/// Agent side of a remote link.
#[derive(Debug)]
pub struct RemoteEndpoint {
    observations: watch::Sender<Option<Observation>>,
    inputs: mpsc::Receiver<String>,
}

impl RemoteEndpoint {
    /// Replace whatever observation is pending. Never blocks.
    pub fn publish(&self, observation: Observation) {
        self.observations.send_replace(Some(observation));
    }

    pub(crate) fn inputs(&mut self) -> &mut mpsc::Receiver<String> {
        &mut self.inputs
    }
}

/// Build both ends of a remote link.
pub fn remote_pair() -> (RemoteEndpoint, RemoteLink) {
    let (obs_tx, obs_rx) = watch::channel(None);
    let (key_tx, key_rx) = mpsc::channel(1);
    (
        RemoteEndpoint {
            observations: obs_tx,
            inputs: key_rx,
        },
        RemoteLink {
            observations: obs_rx,
            inputs: key_tx,
        },
    )
}

/// The kind of an agent and the input plumbing it needs.
pub enum AgentKind {
    Scripted,
    Oscillating,
    Human(Box<dyn InputSource>),
    RemoteHuman(RemoteEndpoint),
}

impl AgentKind {
    pub fn policy(&self) -> Policy {
        match self {
            AgentKind::Scripted => Policy::Scripted,
            AgentKind::Oscillating => Policy::Oscillating,
            AgentKind::Human(_) => Policy::Human,
            AgentKind::RemoteHuman(_) => Policy::RemoteHuman,
        }
    }
}

impl fmt::Debug for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Scripted => f.write_str("Scripted"),
            AgentKind::Oscillating => f.write_str("Oscillating"),
            AgentKind::Human(_) => f.write_str("Human"),
            AgentKind::RemoteHuman(_) => f.write_str("RemoteHuman"),
        }
    }
}

#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    pub(crate) cognition: Cognition,
    /// Requested starting cell; placed automatically when absent
    spawn: Option<Position>,
}

impl Agent {
    /// A new agent at full energy with empty memory.
    pub fn new(id: impl Into<AgentId>, kind: AgentKind, config: &Config) -> Self {
        Self {
            id: id.into(),
            kind,
            cognition: Cognition::new(config.energy.max_energy),
            spawn: None,
        }
    }

    pub fn scripted(id: impl Into<AgentId>, config: &Config) -> Self {
        Self::new(id, AgentKind::Scripted, config)
    }

    pub fn oscillating(id: impl Into<AgentId>, config: &Config) -> Self {
        Self::new(id, AgentKind::Oscillating, config)
    }

    pub fn human(id: impl Into<AgentId>, input: impl InputSource + 'static, config: &Config) -> Self {
        Self::new(id, AgentKind::Human(Box::new(input)), config)
    }

    /// A remote agent plus the link its player drives it through.
    pub fn remote(id: impl Into<AgentId>, config: &Config) -> (Self, RemoteLink) {
        let (endpoint, link) = remote_pair();
        (Self::new(id, AgentKind::RemoteHuman(endpoint), config), link)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.spawn = Some(position);
        self
    }

    pub fn with_energy(mut self, energy: i32) -> Self {
        self.cognition.energy = energy;
        self
    }

    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.cognition.memory = memory;
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut AgentKind {
        &mut self.kind
    }

    pub fn policy(&self) -> Policy {
        self.kind.policy()
    }

    pub fn spawn(&self) -> Option<Position> {
        self.spawn
    }

    pub fn energy(&self) -> i32 {
        self.cognition.energy
    }

    pub fn memory(&self) -> &Memory {
        &self.cognition.memory
    }

    /// Run the whole decision cycle for this agent alone.
    ///
    /// The agent's own signal is emitted into `registry` before contagion
    /// reads it, so any signals already present from other agents this tick
    /// are visible. `input` is used as-is; local input sources and remote
    /// links are not consulted.
    pub fn decide(
        &mut self,
        source: &ObservationSource,
        registry: &mut BeliefRegistry,
        input: Option<&str>,
        config: &Config,
    ) -> Decision {
        let perception = self.cognition.perceive(source, config);
        if let Some(position) = source.position {
            self.cognition.emit(&self.id, position, source.tick, registry);
        }
        self.resolve(source, &perception, registry, input, config)
    }

    /// Turn input into intent and finish the cycle after emission.
    pub(crate) fn resolve(
        &mut self,
        source: &ObservationSource,
        perception: &Perception,
        registry: &BeliefRegistry,
        input: Option<&str>,
        config: &Config,
    ) -> Decision {
        let intent = self.policy().intend(source.tick, input);
        self.cognition.resolve(
            &self.id,
            source.position,
            source.tick,
            perception,
            registry,
            intent,
            config,
        )
    }
}
