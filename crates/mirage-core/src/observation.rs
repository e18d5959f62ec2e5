//! Observation Builder
//!
//! Turns memory plus a visibility snapshot into what the agent experiences
//! this tick. Stale beliefs leak into `visible` as hallucinations; the
//! paranoia cutoff shrinks with scars and fatigue.
//!
//! Everything here is pure: memory is read, never written.

use std::collections::HashSet;

use mirage_types::{MemoryTile, Observation, ObservationSource, Position, Tick};

use crate::cognition::EnergyBand;
use crate::config::Config;
use crate::memory::{Memory, PriorMap};

/// Age cutoff for one tile: the base minus its scars, minus the fatigue delta when energy is low.
pub fn per_tile_paranoia(tile: &MemoryTile, energy: i32, paranoia_base: i64, config: &Config) -> i64 {
    let mut threshold = paranoia_base - i64::from(tile.scar_level);
    if EnergyBand::classify(energy, &config.energy).is_fatigued() {
        threshold -= config.cognition.fatigue_hallucination_delta;
    }
    threshold
}

/// Whether a remembered tile is imagined into view at `tick`.
///
/// Either the memory is older than the tile's paranoia cutoff, or the agent
/// is critically tired and the memory was already past the cutoff before
/// this tick's refresh. A cell seen for the first time this tick had no
/// prior memory and never persists.
pub fn hallucinates(
    tile: &MemoryTile,
    tick: Tick,
    prior: &PriorMap,
    energy: i32,
    paranoia_base: i64,
    config: &Config,
) -> bool {
    let threshold = per_tile_paranoia(tile, energy, paranoia_base, config);
    if tile.age(tick) > threshold {
        return true;
    }
    energy < config.energy.critical_energy_threshold
        && prior
            .get(&tile.tile.position)
            .and_then(|entry| entry.as_ref())
            .is_some_and(|old| old.age(tick) > threshold)
}

/// Positions of every remembered tile that [`hallucinates`] this tick.
pub fn hallucinated_positions(
    memory: &Memory,
    tick: Tick,
    prior: &PriorMap,
    energy: i32,
    paranoia_base: i64,
    config: &Config,
) -> Vec<Position> {
    memory
        .tiles()
        .filter(|mt| hallucinates(mt, tick, prior, energy, paranoia_base, config))
        .map(|mt| mt.tile.position)
        .collect()
}

/// Build the agent-side observation.
///
/// `visible` starts as the source's truthful tiles; hallucinated memories
/// are appended unless their cell is already shown. `known` lists every
/// remembered tile.
pub fn build_observation(
    memory: &Memory,
    source: &ObservationSource,
    prior: &PriorMap,
    energy: i32,
    paranoia_base: i64,
    config: &Config,
) -> Observation {
    let tick = source.tick;
    let mut visible = source.visible.clone();
    let mut shown: HashSet<Position> = visible.iter().map(|t| t.position).collect();
    let mut known = Vec::with_capacity(memory.len());

    for mt in memory.tiles() {
        known.push(mt.belief(tick));

        if hallucinates(mt, tick, prior, energy, paranoia_base, config)
            && shown.insert(mt.tile.position)
        {
            visible.push(mt.tile);
        }
    }

    Observation { visible, known, tick }
}
