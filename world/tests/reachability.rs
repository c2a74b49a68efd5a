use std::{collections::BTreeSet, ops::ControlFlow};

use setlerio_core::{
    BuildingKind, Command, HexCoord, Occupant, ResourceCounts, ResourceKind, SimulationConfig,
};
use setlerio_world::{self as world, query, World};

fn settled_world() -> World {
    let mut world = World::new(SimulationConfig {
        carriers: 0,
        ..SimulationConfig::default()
    });
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceInfluenceOwner {
            hex: HexCoord::ORIGIN,
            kind: BuildingKind::TownCenter,
        },
        &mut events,
    );
    world
}

#[test]
fn search_stops_at_first_target_two_steps_away() {
    let mut world = settled_world();
    let node = HexCoord::new(2, 0);
    let _ = world.set_occupant(
        node,
        Occupant::ResourceNode(ResourceCounts::single(ResourceKind::Wood, 1)),
        true,
    );

    let mut visited = Vec::new();
    let tree = world.path_find(HexCoord::ORIGIN, |hex| {
        visited.push(hex);
        match world.occupant(hex) {
            Some(Occupant::ResourceNode(_)) => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    assert!(tree.terminated_early());
    assert_eq!(visited.last(), Some(&node));
    assert!(visited
        .iter()
        .all(|hex| hex.steps_to(HexCoord::ORIGIN) <= 2));
    assert!(tree
        .discovered()
        .iter()
        .all(|hex| hex.steps_to(HexCoord::ORIGIN) <= 2));
}

#[test]
fn search_covers_the_whole_claimed_interior() {
    let world = settled_world();

    let tree = world.path_find(HexCoord::ORIGIN, |_| ControlFlow::Continue(()));

    let discovered: BTreeSet<_> = tree.discovered().iter().copied().collect();
    let interior: BTreeSet<_> = HexCoord::ORIGIN.range(2, 0).into_iter().collect();
    assert_eq!(discovered, interior);
    assert_eq!(tree.distance_from_start(HexCoord::new(2, -1)), Some(2));
    assert_eq!(query::occupied_tiles(&world), interior.len());
}
