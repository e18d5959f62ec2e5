//! Beliefs and Observations
//!
//! What an agent remembers, what it believes this tick, and what it is shown.
//!
//! # Example
//!
//! ```
//! use mirage_types::{MemoryTile, Position, TileView};
//!
//! let tile = TileView::seen(Position::new(2, 3), 'M');
//! let remembered = MemoryTile::new(tile, 10);
//! assert_eq!(remembered.age(14), 4);
//! assert_eq!(remembered.belief(14).age, 4);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::tile::{Position, TileView};
use crate::Tick;

/// One remembered cell in an agent's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTile {
    pub tile: TileView,
    /// Tick this cell was last truthfully seen (or the weakened tick of hearsay)
    pub last_seen: Tick,
    /// Distrust accumulated from contradictions
    pub scar_level: u32,
}

impl MemoryTile {
    pub fn new(tile: TileView, last_seen: Tick) -> Self {
        Self {
            tile,
            last_seen,
            scar_level: 0,
        }
    }

    pub fn with_scar(mut self, scar_level: u32) -> Self {
        self.scar_level = scar_level;
        self
    }

    /// Ticks elapsed since this cell was last seen.
    pub fn age(&self, tick: Tick) -> Tick {
        tick - self.last_seen
    }

    /// The transient belief this memory yields at `tick`.
    pub fn belief(&self, tick: Tick) -> Belief {
        Belief {
            tile: self.tile,
            age: self.age(tick),
            scar_level: self.scar_level,
        }
    }
}

/// A memory-derived claim about a tile, computed fresh each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Belief {
    pub tile: TileView,
    pub age: Tick,
    pub scar_level: u32,
}

/// The visibility snapshot handed to one agent for one tick.
///
/// Produced by the world's field-of-view from a frozen start-of-tick
/// snapshot. `position` is absent when the agent has not been placed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObservationSource {
    /// Tiles truthfully visible this tick
    pub visible: Vec<TileView>,
    pub tick: Tick,
    pub position: Option<Position>,
}

impl ObservationSource {
    pub fn new(tick: Tick) -> Self {
        Self {
            visible: Vec::new(),
            tick,
            position: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_visible(mut self, visible: Vec<TileView>) -> Self {
        self.visible = visible;
        self
    }

    /// Returns true if the cell is truthfully visible this tick.
    pub fn shows(&self, position: Position) -> bool {
        self.visible.iter().any(|t| t.position == position)
    }
}

/// The agent-side interpretation of a tick.
///
/// `visible` is ground truth plus injected hallucinations; `known` lists
/// every remembered tile as a belief.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub visible: Vec<TileView>,
    pub known: Vec<Belief>,
    pub tick: Tick,
}

impl Observation {
    /// Visible tiles that were not truthfully reported by `source`.
    pub fn hallucinations(&self, source: &ObservationSource) -> Vec<TileView> {
        let truth: HashSet<Position> = source.visible.iter().map(|t| t.position).collect();
        self.visible
            .iter()
            .filter(|t| !truth.contains(&t.position))
            .copied()
            .collect()
    }

    /// Returns true if the position appears in `visible`.
    pub fn shows(&self, position: Position) -> bool {
        self.visible.iter().any(|t| t.position == position)
    }

    /// Belief about a given cell, if one is held.
    pub fn belief_at(&self, position: Position) -> Option<&Belief> {
        self.known.iter().find(|b| b.tile.position == position)
    }
}
