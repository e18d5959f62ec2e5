//! Agent Memory
//!
//! Per-agent record of remembered cells. Each agent owns exactly one
//! `Memory`; it changes only through that agent's own decision cycle.

use std::collections::BTreeMap;

use mirage_types::{Belief, MemoryTile, ObservationSource, Position, Tick};

/// What each refreshed cell held before a truthful update.
///
/// `None` marks a cell the agent had never remembered. It carries no glyph
/// and no age, so it neither conflicts nor keeps a hallucination alive.
pub type PriorMap = BTreeMap<Position, Option<MemoryTile>>;

/// Last-known tiles keyed by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Memory {
    tiles: BTreeMap<Position, MemoryTile>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a memory from stored tiles (e.g. a persisted agent).
    pub fn from_tiles(tiles: impl IntoIterator<Item = MemoryTile>) -> Self {
        Self {
            tiles: tiles
                .into_iter()
                .map(|mt| (mt.tile.position, mt))
                .collect(),
        }
    }

    pub fn get(&self, position: Position) -> Option<&MemoryTile> {
        self.tiles.get(&position)
    }

    pub(crate) fn get_mut(&mut self, position: Position) -> Option<&mut MemoryTile> {
        self.tiles.get_mut(&position)
    }

    pub fn insert(&mut self, position: Position, tile: MemoryTile) {
        self.tiles.insert(position, tile);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Remembered tiles in position order
    pub fn tiles(&self) -> impl Iterator<Item = &MemoryTile> {
        self.tiles.values()
    }

    /// Overwrite every truthfully visible cell with what the source shows.
    ///
    /// The stored scar level survives the overwrite. Returns what each
    /// refreshed cell held beforehand.
    pub fn update_from_visible(&mut self, source: &ObservationSource) -> PriorMap {
        let mut prior = PriorMap::new();
        for tile in source.visible.iter().filter(|t| t.visible) {
            let previous = self.tiles.get(&tile.position).copied();
            let scar_level = previous.map_or(0, |mt| mt.scar_level);
            self.tiles.insert(
                tile.position,
                MemoryTile::new(*tile, source.tick).with_scar(scar_level),
            );
            // First sighting wins if the source lists a cell twice
            prior.entry(tile.position).or_insert(previous);
        }
        prior
    }

    /// Every remembered tile as a belief aged against `tick`.
    pub fn beliefs(&self, tick: Tick) -> Vec<Belief> {
        self.tiles.values().map(|mt| mt.belief(tick)).collect()
    }

    /// Lower every scar by one, never below zero. Returns how many tiles healed.
    pub fn heal_scars(&mut self) -> usize {
        let mut healed = 0;
        for mt in self.tiles.values_mut().filter(|mt| mt.scar_level > 0) {
            mt.scar_level -= 1;
            healed += 1;
        }
        healed
    }

    pub fn total_scars(&self) -> u32 {
        self.tiles.values().map(|mt| mt.scar_level).sum()
    }
}
