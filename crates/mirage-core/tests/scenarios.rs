//! Single-agent decision scenarios
//!
//! Drives agents through `Agent::decide` directly, without an orchestrator.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mirage_core::movement::resolve_movement;
use mirage_core::{Agent, BeliefRegistry, Config, EnergyBand, Memory, QueuedInput, World};
use mirage_types::{Action, AgentId, MemoryTile, ObservationSource, Position, TileView};

fn remembered(pos: Position, glyph: char, last_seen: i64) -> MemoryTile {
    MemoryTile::new(TileView::seen(pos, glyph), last_seen)
}

/// Scripted agent with nothing remembered ahead simply walks east
#[test]
fn test_scripted_moves_east() {
    let config = Config::default();
    let world = World::new(80, 25, Position::new(0, 12));
    let mut agent = Agent::scripted("A", &config);
    let origin = Position::new(0, 0);
    let source = ObservationSource::new(10).at(origin);
    assert!(world.in_bounds(origin));

    let mut registry = BeliefRegistry::new();
    let decision = agent.decide(&source, &mut registry, None, &config);

    assert_eq!(decision.action, Action::MoveE);
    assert_eq!(
        resolve_movement(origin, decision.action, world.width(), world.height()),
        Position::new(1, 0)
    );
    assert_eq!(agent.energy(), config.energy.max_energy - config.energy.move_energy_cost);
}

/// A stale memory of the destination turns the move into an observation
#[test]
fn test_stale_destination_forces_observe() {
    let config = Config::default();
    let tick = 10;
    let memory = Memory::from_tiles([remembered(
        Position::new(1, 0),
        '.',
        tick - (config.cognition.caution_threshold + 1),
    )]);
    let mut agent = Agent::scripted("A", &config).with_memory(memory);
    let origin = Position::new(0, 0);
    let source = ObservationSource::new(tick).at(origin);

    let decision = agent.decide(&source, &mut BeliefRegistry::new(), None, &config);

    assert_eq!(decision.intended, Action::MoveE);
    assert_eq!(decision.action, Action::Observe);
    assert_eq!(resolve_movement(origin, decision.action, 80, 25), origin);
    assert_eq!(agent.energy(), config.energy.max_energy - config.energy.observe_energy_cost);
}

/// A fresh belief spreads to a neighbour as weakened hearsay
#[test]
fn test_belief_spreads_to_neighbour() {
    let config = Config::default();
    let tick = 100;
    let target = Position::new(5, 5);

    let mut a = Agent::scripted("A", &config).with_memory(Memory::from_tiles([remembered(target, 'Z', tick)]));
    let mut b = Agent::scripted("B", &config);
    let mut registry = BeliefRegistry::for_tick(tick);

    a.decide(&ObservationSource::new(tick).at(Position::new(0, 0)), &mut registry, None, &config);
    let decision = b.decide(&ObservationSource::new(tick).at(Position::new(1, 0)), &mut registry, None, &config);

    assert_eq!(decision.transferred, vec![target]);
    let adopted = b.memory().get(target).unwrap();
    assert_eq!(adopted.tile.glyph, 'Z');
    assert_eq!(adopted.last_seen, tick - config.contagion.transfer_penalty);
}

/// Below the critical threshold nothing but WAIT happens
#[test]
fn test_critical_energy_always_waits() {
    let config = Config::default();
    let critical = config.energy.critical_energy_threshold - 1;

    for key in ["w", "a", "s", "d", "e", "q", ""] {
        let mut player = Agent::human("P", QueuedInput::default(), &config).with_energy(critical);
        let source = ObservationSource::new(3).at(Position::new(4, 4));
        let decision = player.decide(&source, &mut BeliefRegistry::new(), Some(key), &config);

        assert_eq!(decision.band, EnergyBand::Critical);
        assert_eq!(decision.action, Action::Wait, "key {key:?}");
        assert_eq!(player.energy(), critical + config.energy.wait_energy_restore);
    }

    for npc in [Agent::scripted("S", &config), Agent::oscillating("O", &config)] {
        let mut npc = npc.with_energy(critical);
        let source = ObservationSource::new(3).at(Position::new(4, 4));
        let decision = npc.decide(&source, &mut BeliefRegistry::new(), None, &config);
        assert_eq!(decision.action, Action::Wait);
    }
}

/// Truthfully visible tiles are age zero right after the agent decides
#[test]
fn test_visible_tiles_refreshed() {
    let config = Config::default();
    let world = World::new(20, 20, Position::new(3, 3));
    let tick = 42;
    let mut agent = Agent::scripted("A", &config).with_memory(Memory::from_tiles([remembered(
        Position::new(3, 3),
        '.',
        1,
    )]));
    let source = world.observation_source(&AgentId::from("A"), tick, 2);
    // Unplaced in this world: nothing to see
    assert!(source.visible.is_empty());

    let source = ObservationSource::new(tick)
        .at(Position::new(2, 2))
        .with_visible(world.visible_from(Position::new(2, 2), 2));
    agent.decide(&source, &mut BeliefRegistry::new(), None, &config);

    for tile in &source.visible {
        assert_eq!(agent.memory().get(tile.position).unwrap().age(tick), 0);
    }
    assert_eq!(agent.memory().get(Position::new(3, 3)).unwrap().tile.glyph, 'M');
}

/// Energy stays clamped and only OBSERVE lowers scars, one step at a time
#[test]
fn test_energy_and_scar_invariants_randomized() {
    let config = Config::default();
    let keys = ["w", "a", "s", "d", "e", ".", "x"];
    let mut rng = SmallRng::seed_from_u64(99);

    let mut memory = Memory::new();
    for x in 0..6 {
        memory.insert(
            Position::new(x, 9),
            remembered(Position::new(x, 9), 'M', 0).with_scar(rng.gen_range(0..3)),
        );
    }
    let mut player = Agent::human("P", QueuedInput::default(), &config).with_memory(memory);
    let mut position = Position::new(10, 10);

    for tick in 0..300 {
        let key = keys[rng.gen_range(0..keys.len())];
        let scars_before: Vec<u32> = player.memory().tiles().map(|mt| mt.scar_level).collect();

        let source = ObservationSource::new(tick).at(position);
        let decision = player.decide(&source, &mut BeliefRegistry::new(), Some(key), &config);
        position = resolve_movement(position, decision.action, 20, 20);

        let energy = player.energy();
        assert!(energy >= config.energy.min_energy && energy <= config.energy.max_energy);

        let scars_after: Vec<u32> = player.memory().tiles().map(|mt| mt.scar_level).collect();
        for (before, after) in scars_before.iter().zip(&scars_after) {
            if decision.action == Action::Observe {
                assert_eq!(*after, before.saturating_sub(1));
            } else {
                assert_eq!(after, before);
            }
        }
    }
}
