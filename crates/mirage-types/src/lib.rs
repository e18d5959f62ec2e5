//! Shared data types for the mirage simulation.
//!
//! This crate contains pure data structures with no simulation logic. The
//! engine in `mirage-core` depends on it, and so can any collaborator that
//! frames observations for a wire protocol or persists agent memory.

pub mod action;
pub mod agent;
pub mod observation;
pub mod tile;

pub use action::Action;
pub use agent::AgentId;
pub use observation::{Belief, MemoryTile, Observation, ObservationSource};
pub use tile::{glyph, Position, TileView};

/// One discrete simulation step.
///
/// Signed so that a `last_seen` can sit before tick 0, where transferred or
/// scarred beliefs are pushed by a penalty.
pub type Tick = i64;
