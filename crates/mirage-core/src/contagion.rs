//! Belief Contagion and Conflict
//!
//! Agents broadcast what they believe once per tick; nearby agents may adopt
//! those beliefs as weakened hearsay. Separately, when an agent's own fresh
//! observation contradicts a confidently held memory, the clash leaves a
//! scar on that memory.
//!
//! Both rules compare beliefs by the same strength measure:
//! `max(0, paranoia_threshold - age) + scar_level`.

use std::collections::BTreeMap;

use mirage_types::{AgentId, Belief, MemoryTile, Position, Tick};

use crate::cognition::EnergyBand;
use crate::config::Config;
use crate::memory::{Memory, PriorMap};

/// How firmly a belief of the given age and scar level is held.
pub fn strength(age: Tick, scar_level: u32, paranoia_threshold: i64) -> i64 {
    (paranoia_threshold - age).max(0) + i64::from(scar_level)
}

/// Manhattan distance between two cells.
pub fn manhattan(a: Position, b: Position) -> i32 {
    a.manhattan(b)
}

/// One agent's broadcast for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefSignal {
    /// Where the sender stood when it emitted
    pub position: Position,
    pub beliefs: Vec<Belief>,
}

/// Tick-scoped broadcast board holding at most one signal per agent.
///
/// The orchestrator allocates one per tick, fills it during the emission
/// pass, and only then lets agents read it. Emitting with a tick other than
/// the one the registry holds clears every signal first.
#[derive(Debug, Clone, Default)]
pub struct BeliefRegistry {
    tick: Option<Tick>,
    signals: BTreeMap<AgentId, BeliefSignal>,
}

impl BeliefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry already bound to `tick`.
    pub fn for_tick(tick: Tick) -> Self {
        Self {
            tick: Some(tick),
            signals: BTreeMap::new(),
        }
    }

    /// Store (or replace) the agent's signal for `tick`.
    pub fn emit(&mut self, id: &AgentId, tick: Tick, position: Position, beliefs: Vec<Belief>) {
        if self.tick != Some(tick) {
            self.signals.clear();
            self.tick = Some(tick);
        }
        self.signals
            .insert(id.clone(), BeliefSignal { position, beliefs });
    }

    /// The tick the held signals belong to
    pub fn tick(&self) -> Option<Tick> {
        self.tick
    }

    pub fn get(&self, id: &AgentId) -> Option<&BeliefSignal> {
        self.signals.get(id)
    }

    /// Signals in agent-id order.
    pub fn signals(&self) -> impl Iterator<Item = (&AgentId, &BeliefSignal)> {
        self.signals.iter()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Adopt eligible beliefs broadcast by other agents within the belief radius.
///
/// A belief is considered when the receiver lacks the cell, holds an older
/// sighting than the sender, or is low on energy. If the receiver already
/// holds the cell, the sender must be strictly stronger. Adopted beliefs land
/// `transfer_penalty` ticks in the past and keep the receiver's scar level.
///
/// Returns the positions written, in the order they were written.
pub fn apply_belief_contagion(
    registry: &BeliefRegistry,
    receiver: &AgentId,
    receiver_position: Position,
    tick: Tick,
    memory: &mut Memory,
    receiver_energy: i32,
    config: &Config,
) -> Vec<Position> {
    let mut transferred = Vec::new();
    if registry.tick() != Some(tick) {
        return transferred;
    }

    let paranoia = config.cognition.paranoia_threshold;
    let fatigued = EnergyBand::classify(receiver_energy, &config.energy).is_fatigued();

    for (sender, signal) in registry.signals() {
        if sender == receiver
            || manhattan(signal.position, receiver_position) > config.contagion.belief_radius
        {
            continue;
        }

        for belief in &signal.beliefs {
            let position = belief.tile.position;
            let sender_last_seen = tick - belief.age;

            let prior_scar = match memory.get(position) {
                Some(current) => {
                    if !(current.last_seen < sender_last_seen || fatigued) {
                        continue;
                    }
                    let sender_strength = strength(belief.age, belief.scar_level, paranoia);
                    let receiver_strength =
                        strength(current.age(tick), current.scar_level, paranoia);
                    if sender_strength <= receiver_strength {
                        continue;
                    }
                    current.scar_level
                }
                None => 0,
            };

            memory.insert(
                position,
                MemoryTile::new(belief.tile, tick - config.contagion.transfer_penalty)
                    .with_scar(prior_scar),
            );
            tracing::debug!(
                "{} adopted belief at {} from {} (age {})",
                receiver,
                position,
                sender,
                belief.age
            );
            transferred.push(position);
        }
    }

    transferred
}

/// Scar memories whose fresh contents contradict a confidently held prior.
///
/// Only cells refreshed this tick (present in `prior` with a real entry) are
/// checked. When both the old and the current belief are at least
/// `conflict_threshold` strong, the current entry gains one scar and its
/// `last_seen` is pushed back to at most `tick - scar_penalty`.
///
/// Returns the scarred positions.
pub fn detect_and_apply_conflicts(
    memory: &mut Memory,
    prior: &PriorMap,
    tick: Tick,
    config: &Config,
) -> Vec<Position> {
    let paranoia = config.cognition.paranoia_threshold;
    let threshold = config.contagion.conflict_threshold;
    let mut scarred = Vec::new();

    for (position, old) in prior {
        let Some(old) = old else {
            continue;
        };
        let Some(current) = memory.get_mut(*position) else {
            continue;
        };
        if old.tile.glyph == current.tile.glyph {
            continue;
        }

        let old_strength = strength(old.age(tick), old.scar_level, paranoia);
        let new_strength = strength(current.age(tick), current.scar_level, paranoia);
        if old_strength >= threshold && new_strength >= threshold {
            current.scar_level += 1;
            current.last_seen = current.last_seen.min(tick - config.contagion.scar_penalty);
            tracing::debug!(
                "Conflict at {}: '{}' vs '{}' (scar now {})",
                position,
                old.tile.glyph,
                current.tile.glyph,
                current.scar_level
            );
            scarred.push(*position);
        }
    }

    scarred
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_types::{ObservationSource, TileView};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn tile(pos: Position, glyph: char) -> TileView {
        TileView::seen(pos, glyph)
    }

    fn belief(pos: Position, glyph: char, age: Tick, scar: u32) -> Belief {
        Belief {
            tile: tile(pos, glyph),
            age,
            scar_level: scar,
        }
    }

    #[test]
    fn test_strength_floor() {
        assert_eq!(strength(0, 0, 5), 5);
        assert_eq!(strength(7, 0, 5), 0);
        assert_eq!(strength(7, 2, 5), 2);
        assert_eq!(strength(-2, 0, 5), 7);
    }

    #[test]
    fn test_belief_transfers_in_range() {
        let cfg = Config::default();
        let tick = 100;
        let target = Position::new(5, 5);
        let mut registry = BeliefRegistry::new();
        registry.emit(&AgentId::from("A"), tick, Position::new(0, 0), vec![belief(target, 'Z', 0, 0)]);

        let mut b_mem = Memory::new();
        let applied = apply_belief_contagion(
            &registry,
            &AgentId::from("B"),
            Position::new(1, 0),
            tick,
            &mut b_mem,
            cfg.energy.max_energy,
            &cfg,
        );

        assert_eq!(applied, vec![target]);
        let mt = b_mem.get(target).unwrap();
        assert_eq!(mt.last_seen, tick - cfg.contagion.transfer_penalty);
        assert_eq!(mt.tile.glyph, 'Z');
    }

    #[test]
    fn test_own_signal_ignored() {
        let cfg = Config::default();
        let me = AgentId::from("A");
        let mut registry = BeliefRegistry::new();
        registry.emit(&me, 3, Position::new(0, 0), vec![belief(Position::new(9, 9), 'M', 0, 0)]);

        let mut mem = Memory::new();
        let applied = apply_belief_contagion(&registry, &me, Position::new(0, 0), 3, &mut mem, 20, &cfg);
        assert!(applied.is_empty());
        assert!(mem.is_empty());
    }

    #[test]
    fn test_signals_from_other_tick_ignored() {
        let cfg = Config::default();
        let mut registry = BeliefRegistry::new();
        registry.emit(&AgentId::from("A"), 3, Position::new(0, 0), vec![belief(Position::new(9, 9), 'M', 0, 0)]);

        let mut mem = Memory::new();
        let applied =
            apply_belief_contagion(&registry, &AgentId::from("B"), Position::new(0, 0), 4, &mut mem, 20, &cfg);
        assert!(applied.is_empty());
    }

    #[test]
    fn test_registry_lazy_reset() {
        let mut registry = BeliefRegistry::for_tick(1);
        registry.emit(&AgentId::from("A"), 1, Position::new(0, 0), Vec::new());
        registry.emit(&AgentId::from("B"), 1, Position::new(1, 0), Vec::new());
        // Re-emission replaces
        registry.emit(&AgentId::from("A"), 1, Position::new(2, 0), Vec::new());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&AgentId::from("A")).unwrap().position, Position::new(2, 0));

        registry.emit(&AgentId::from("C"), 2, Position::new(0, 0), Vec::new());
        assert_eq!(registry.tick(), Some(2));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&AgentId::from("A")).is_none());
    }

    #[test]
    fn test_newer_receiver_belief_blocks_transfer() {
        let cfg = Config::default();
        let tick = 40;
        let target = Position::new(3, 3);
        let mut registry = BeliefRegistry::new();
        registry.emit(&AgentId::from("A"), tick, Position::new(0, 0), vec![belief(target, 'M', 3, 0)]);

        let mut mem = Memory::new();
        mem.insert(target, MemoryTile::new(tile(target, '.'), tick - 1));
        let applied =
            apply_belief_contagion(&registry, &AgentId::from("B"), Position::new(0, 1), tick, &mut mem, 20, &cfg);

        assert!(applied.is_empty());
        assert_eq!(mem.get(target).unwrap().tile.glyph, '.');
    }

    #[test]
    fn test_fatigue_admits_but_dominance_decides() {
        let cfg = Config::default();
        let tick = 40;
        let target = Position::new(3, 3);
        let low = cfg.energy.low_energy_threshold - 1;

        // Sender older but heavily scarred: stronger than a fresh receiver
        let mut registry = BeliefRegistry::new();
        registry.emit(&AgentId::from("A"), tick, Position::new(0, 0), vec![belief(target, 'M', 1, 3)]);

        let mut mem = Memory::new();
        mem.insert(target, MemoryTile::new(tile(target, '.'), tick).with_scar(1));
        let applied =
            apply_belief_contagion(&registry, &AgentId::from("B"), Position::new(0, 1), tick, &mut mem, low, &cfg);

        assert_eq!(applied, vec![target]);
        let mt = mem.get(target).unwrap();
        assert_eq!(mt.tile.glyph, 'M');
        // Receiver's own scar survives the transfer
        assert_eq!(mt.scar_level, 1);

        // Same signal at full energy is not even eligible
        let mut rested = Memory::new();
        rested.insert(target, MemoryTile::new(tile(target, '.'), tick).with_scar(1));
        let applied = apply_belief_contagion(
            &registry,
            &AgentId::from("B"),
            Position::new(0, 1),
            tick,
            &mut rested,
            cfg.energy.max_energy,
            &cfg,
        );
        assert!(applied.is_empty());
    }

    #[test]
    fn test_range_law_randomized() {
        let cfg = Config::default();
        let radius = cfg.contagion.belief_radius;
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..500 {
            let tick: Tick = rng.gen_range(0..1000);
            let sender_pos = Position::new(rng.gen_range(-20..20), rng.gen_range(-20..20));
            let dx: i32 = rng.gen_range(-10..=10);
            let min_dy = (radius + 1 - dx.abs()).max(0);
            let dy = rng.gen_range(min_dy..=min_dy + 5) * if rng.gen::<bool>() { 1 } else { -1 };
            let receiver_pos = Position::new(sender_pos.x + dx, sender_pos.y + dy);
            assert!(manhattan(sender_pos, receiver_pos) > radius);

            let beliefs = (0..4)
                .map(|i| {
                    belief(
                        Position::new(i, 50),
                        'M',
                        rng.gen_range(-3..20),
                        rng.gen_range(0..6),
                    )
                })
                .collect();
            let mut registry = BeliefRegistry::new();
            registry.emit(&AgentId::from("A"), tick, sender_pos, beliefs);

            let mut mem = Memory::new();
            if rng.gen::<bool>() {
                let pos = Position::new(0, 50);
                mem.insert(pos, MemoryTile::new(tile(pos, '.'), tick - rng.gen_range(0..30)));
            }
            let before = mem.clone();
            let energy = rng.gen_range(cfg.energy.min_energy..=cfg.energy.max_energy);

            let applied =
                apply_belief_contagion(&registry, &AgentId::from("B"), receiver_pos, tick, &mut mem, energy, &cfg);
            assert!(applied.is_empty());
            assert_eq!(mem, before);
        }
    }

    #[test]
    fn test_dominance_law_randomized() {
        let cfg = Config::default();
        let paranoia = cfg.cognition.paranoia_threshold;
        let low = cfg.energy.low_energy_threshold - 1;
        let target = Position::new(7, 7);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..500 {
            let tick: Tick = 100;
            let sender_age = rng.gen_range(0..12);
            let sender_scar = rng.gen_range(0..5);
            let receiver_age = rng.gen_range(0..12);
            let receiver_scar = rng.gen_range(0..5);

            let mut registry = BeliefRegistry::new();
            registry.emit(
                &AgentId::from("A"),
                tick,
                Position::new(0, 0),
                vec![belief(target, 'M', sender_age, sender_scar)],
            );
            let mut mem = Memory::new();
            mem.insert(
                target,
                MemoryTile::new(tile(target, '.'), tick - receiver_age).with_scar(receiver_scar),
            );

            // Low energy makes every held cell eligible, isolating the dominance rule
            let applied =
                apply_belief_contagion(&registry, &AgentId::from("B"), Position::new(1, 0), tick, &mut mem, low, &cfg);

            let expected = strength(sender_age, sender_scar, paranoia)
                > strength(receiver_age, receiver_scar, paranoia);
            assert_eq!(!applied.is_empty(), expected, "sender ({sender_age},{sender_scar}) receiver ({receiver_age},{receiver_scar})");
        }
    }

    #[test]
    fn test_conflict_scars_strong_contradiction() {
        let cfg = Config::default();
        let tick = 20;
        let pos = Position::new(1, 0);
        let mut mem = Memory::new();
        mem.insert(pos, MemoryTile::new(tile(pos, 'M'), tick - 1));

        let prior = mem.update_from_visible(&ObservationSource::new(tick).with_visible(vec![tile(pos, '.')]));
        let scarred = detect_and_apply_conflicts(&mut mem, &prior, tick, &cfg);

        assert_eq!(scarred, vec![pos]);
        let mt = mem.get(pos).unwrap();
        assert_eq!(mt.scar_level, 1);
        assert!(mt.last_seen <= tick - cfg.contagion.scar_penalty);
        assert_eq!(mt.tile.glyph, '.');
    }

    #[test]
    fn test_conflict_ignores_weak_or_agreeing_priors() {
        let cfg = Config::default();
        let tick = 20;
        let stale = Position::new(1, 0);
        let same = Position::new(2, 0);
        let fresh = Position::new(3, 0);
        let mut mem = Memory::new();
        // Too old to be held strongly
        mem.insert(stale, MemoryTile::new(tile(stale, 'M'), tick - 10));
        mem.insert(same, MemoryTile::new(tile(same, '.'), tick - 1));

        let prior = mem.update_from_visible(
            &ObservationSource::new(tick).with_visible(vec![tile(stale, '.'), tile(same, '.'), tile(fresh, 'M')]),
        );
        let scarred = detect_and_apply_conflicts(&mut mem, &prior, tick, &cfg);

        assert!(scarred.is_empty());
        assert_eq!(mem.total_scars(), 0);
        assert_eq!(mem.get(fresh).unwrap().last_seen, tick);
    }

    #[test]
    fn test_conflict_law_randomized() {
        let cfg = Config::default();
        let paranoia = cfg.cognition.paranoia_threshold;
        let pos = Position::new(0, 0);
        let mut rng = SmallRng::seed_from_u64(1234);

        for _ in 0..300 {
            let tick: Tick = 50;
            let old_age = rng.gen_range(0..10);
            let old_scar = rng.gen_range(0..4);
            let mut mem = Memory::new();
            mem.insert(pos, MemoryTile::new(tile(pos, 'M'), tick - old_age).with_scar(old_scar));

            let prior = mem.update_from_visible(&ObservationSource::new(tick).with_visible(vec![tile(pos, '.')]));
            detect_and_apply_conflicts(&mut mem, &prior, tick, &cfg);

            let both_strong = strength(old_age, old_scar, paranoia) >= cfg.contagion.conflict_threshold
                && strength(0, old_scar, paranoia) >= cfg.contagion.conflict_threshold;
            let mt = mem.get(pos).unwrap();
            if both_strong {
                assert_eq!(mt.scar_level, old_scar + 1);
                assert!(mt.last_seen <= tick - cfg.contagion.scar_penalty);
            } else {
                assert_eq!(mt.scar_level, old_scar);
                assert_eq!(mt.last_seen, tick);
            }
        }
    }
}
