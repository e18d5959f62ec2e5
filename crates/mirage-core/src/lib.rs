//! Mirage Cognition Engine
//!
//! Grid agents that remember what they saw, forget how recently they saw it,
//! imagine stale memories back into view, catch beliefs from their
//! neighbours, and scar when the world contradicts them. A single
//! orchestrator advances the world and every agent in lockstep ticks.
//!
//! # Example
//!
//! ```no_run
//! use mirage_core::{Agent, Config, Orchestrator};
//!
//! # async fn demo() -> Result<(), mirage_core::SimError> {
//! let config = Config::default();
//! let agents = vec![Agent::scripted("walker", &config), Agent::oscillating("pacer", &config)];
//! let mut orchestrator = Orchestrator::new(config, agents)?;
//! let report = orchestrator.tick_once().await;
//! assert_eq!(report.decisions.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cognition;
pub mod config;
pub mod contagion;
pub mod memory;
pub mod movement;
pub mod observation;
pub mod tick;
pub mod world;

pub use agent::{remote_pair, Agent, AgentKind, InputSource, QueuedInput, RemoteLink, StdinInput};
pub use cognition::{parse_key, Cognition, Decision, EnergyBand, Intent, Policy};
pub use config::{Config, ConfigError};
pub use contagion::BeliefRegistry;
pub use memory::{Memory, PriorMap};
pub use tick::{Orchestrator, SimError, TickReport};
pub use world::World;
